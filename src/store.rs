//! Document store for marketplace entities.
//!
//! One collection per entity, held in a single snapshot behind a
//! `parking_lot::RwLock`. Collections are insertion-ordered maps keyed by
//! entity id, so "newest first" listings are a reverse iteration. Uniqueness
//! (location/category/subcategory slug, admin username) is enforced inside the
//! write lock at insert time: when two requests race on the same derived slug,
//! the loser gets [`StoreError::Duplicate`] from the index, not from an
//! application-level pre-check.
//!
//! Durability is a whole-snapshot JSON file written atomically (temp file +
//! rename) after every successful mutation. An in-memory store (no path) backs
//! the test suites.

use crate::error::ApiError;
use crate::model::{
    Admin, AdminId, Booking, Category, CategoryId, ContactMessage, Location, LocationId, Provider,
    Subcategory, SubcategoryId,
};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique index rejected the write.
    #[error("{entity} with this {field} already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Deletion refused while dependents still reference the entity.
    #[error("{entity} is still referenced by {dependents}")]
    Referenced {
        entity: &'static str,
        dependents: &'static str,
    },

    /// Snapshot could not be written to disk.
    #[error("snapshot persistence failed")]
    Persist(#[source] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { entity, field } => ApiError::Duplicate { entity, field },
            StoreError::NotFound { entity } => ApiError::NotFound { entity },
            StoreError::Referenced { entity, dependents } => {
                ApiError::Validation(format!("{entity} is still referenced by {dependents}"))
            }
            StoreError::Persist(source) => ApiError::Internal(source),
        }
    }
}

/// The full persisted state: one insertion-ordered collection per entity.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub locations: IndexMap<String, Location>,
    #[serde(default)]
    pub categories: IndexMap<String, Category>,
    #[serde(default)]
    pub subcategories: IndexMap<String, Subcategory>,
    #[serde(default)]
    pub providers: IndexMap<String, Provider>,
    #[serde(default)]
    pub bookings: IndexMap<String, Booking>,
    #[serde(default)]
    pub admins: IndexMap<String, Admin>,
    #[serde(default)]
    pub contact_messages: IndexMap<String, ContactMessage>,
}

impl Snapshot {
    pub fn location_slug_taken(&self, slug: &str, exclude: Option<&LocationId>) -> bool {
        self.locations
            .values()
            .any(|l| l.slug.eq_ignore_ascii_case(slug) && exclude != Some(&l.id))
    }

    pub fn category_slug_taken(&self, slug: &str, exclude: Option<&CategoryId>) -> bool {
        self.categories
            .values()
            .any(|c| c.slug.eq_ignore_ascii_case(slug) && exclude != Some(&c.id))
    }

    pub fn subcategory_slug_taken(&self, slug: &str, exclude: Option<&SubcategoryId>) -> bool {
        self.subcategories
            .values()
            .any(|s| s.slug.eq_ignore_ascii_case(slug) && exclude != Some(&s.id))
    }

    pub fn insert_location(&mut self, location: Location) -> Result<(), StoreError> {
        if self.location_slug_taken(&location.slug, None) {
            return Err(StoreError::Duplicate {
                entity: "location",
                field: "slug",
            });
        }
        self.locations.insert(location.id.to_string(), location);
        Ok(())
    }

    pub fn insert_category(&mut self, category: Category) -> Result<(), StoreError> {
        if self.category_slug_taken(&category.slug, None) {
            return Err(StoreError::Duplicate {
                entity: "category",
                field: "slug",
            });
        }
        self.categories.insert(category.id.to_string(), category);
        Ok(())
    }

    pub fn insert_subcategory(&mut self, subcategory: Subcategory) -> Result<(), StoreError> {
        if self.subcategory_slug_taken(&subcategory.slug, None) {
            return Err(StoreError::Duplicate {
                entity: "subcategory",
                field: "slug",
            });
        }
        self.subcategories
            .insert(subcategory.id.to_string(), subcategory);
        Ok(())
    }

    pub fn insert_provider(&mut self, provider: Provider) {
        self.providers.insert(provider.id.to_string(), provider);
    }

    pub fn insert_booking(&mut self, booking: Booking) {
        self.bookings.insert(booking.id.to_string(), booking);
    }

    pub fn insert_admin(&mut self, admin: Admin) -> Result<(), StoreError> {
        if self
            .admins
            .values()
            .any(|a| a.username.eq_ignore_ascii_case(&admin.username) && a.id != admin.id)
        {
            return Err(StoreError::Duplicate {
                entity: "admin",
                field: "username",
            });
        }
        self.admins.insert(admin.id.to_string(), admin);
        Ok(())
    }

    pub fn insert_contact_message(&mut self, message: ContactMessage) {
        self.contact_messages.insert(message.id.to_string(), message);
    }

    pub fn admin_by_username(&self, username: &str) -> Option<&Admin> {
        self.admins.values().find(|a| a.username == username)
    }

    pub fn admin_by_id(&self, id: &AdminId) -> Option<&Admin> {
        self.admins.get(id.as_str())
    }
}

pub struct Store {
    path: Option<PathBuf>,
    data: RwLock<Snapshot>,
}

impl Store {
    /// Volatile store for tests and ephemeral runs.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(Snapshot::default()),
        }
    }

    /// Open (or create) a file-backed store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read store snapshot {path:?}"))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse store snapshot {path:?}"))?
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create data directory {parent:?}"))?;
            }
            Snapshot::default()
        };
        Ok(Self {
            path: Some(path),
            data: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a read-only closure against the snapshot.
    pub fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
        f(&self.data.read())
    }

    /// Run a mutation atomically under the write lock and persist on success.
    ///
    /// Closures must validate before they mutate: an `Err` return is assumed
    /// to have left the snapshot untouched, so no write hits the disk and no
    /// partial record is ever observable.
    pub fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut data = self.data.write();
        let out = f(&mut data)?;
        if let Some(path) = &self.path {
            write_snapshot(path, &data).map_err(StoreError::Persist)?;
        }
        Ok(out)
    }

    /// Force the current snapshot to disk; used by graceful shutdown.
    pub fn flush(&self) -> Result<()> {
        if let Some(path) = &self.path {
            let data = self.data.read();
            write_snapshot(path, &data)?;
            debug!(path = ?path, "store snapshot flushed");
        }
        Ok(())
    }
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let bytes = serde_json::to_vec_pretty(snapshot).context("failed to serialize snapshot")?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp snapshot in {parent:?}"))?;
    tmp.write_all(&bytes).context("failed to write snapshot")?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace snapshot {path:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocationId;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn location(slug: &str) -> Location {
        Location {
            id: LocationId::generate(),
            name: slug.to_string(),
            slug: slug.to_string(),
            district: "Malappuram".into(),
            state: "Kerala".into(),
            pincode: None,
            is_active: true,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_location_slug_rejected_at_insert() {
        let store = Store::in_memory();
        store
            .mutate(|s| s.insert_location(location("malappuram")))
            .unwrap();
        let err = store
            .mutate(|s| s.insert_location(location("malappuram")))
            .unwrap_err();
        assert_matches!(
            err,
            StoreError::Duplicate {
                entity: "location",
                field: "slug"
            }
        );
        assert_eq!(store.read(|s| s.locations.len()), 1);
    }

    #[test]
    fn slug_uniqueness_is_case_insensitive() {
        let store = Store::in_memory();
        store
            .mutate(|s| s.insert_location(location("calicut")))
            .unwrap();
        let mut upper = location("other");
        upper.slug = "CALICUT".into();
        let err = store.mutate(|s| s.insert_location(upper)).unwrap_err();
        assert_matches!(err, StoreError::Duplicate { .. });
    }

    #[test]
    fn failed_mutation_leaves_snapshot_unchanged() {
        let store = Store::in_memory();
        let result: Result<(), StoreError> = store.mutate(|_| {
            Err(StoreError::NotFound {
                entity: "subcategory",
            })
        });
        assert!(result.is_err());
        assert_eq!(store.read(|s| s.bookings.len()), 0);
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servicemart.json");

        let store = Store::open(&path).unwrap();
        store
            .mutate(|s| s.insert_location(location("malappuram")))
            .unwrap();
        drop(store);

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.read(|s| s.locations.len()), 1);
        assert!(reopened.read(|s| s.location_slug_taken("malappuram", None)));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let store = Store::in_memory();
        for slug in ["a", "b", "c"] {
            store.mutate(|s| s.insert_location(location(slug))).unwrap();
        }
        let slugs: Vec<String> =
            store.read(|s| s.locations.values().rev().map(|l| l.slug.clone()).collect());
        assert_eq!(slugs, ["c", "b", "a"]);
    }
}
