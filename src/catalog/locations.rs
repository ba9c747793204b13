//! Location Registry: canonical service locations admins manage and catalog
//! entities reference by slug.

use crate::auth::AdminIdentity;
use crate::error::{ApiError, ApiResult};
use crate::model::{Location, LocationCreate, LocationId, LocationUpdate};
use crate::slug::is_valid_slug;
use crate::store::{Store, StoreError};
use chrono::Utc;
use tracing::info;

const DEFAULT_STATE: &str = "Kerala";

/// All active locations, in registration order. Small cardinality; no
/// pagination.
pub fn list_active(store: &Store) -> Vec<Location> {
    store.read(|s| {
        s.locations
            .values()
            .filter(|l| l.is_active)
            .cloned()
            .collect()
    })
}

pub fn create_location(
    store: &Store,
    admin: &AdminIdentity,
    payload: LocationCreate,
) -> ApiResult<Location> {
    let mut missing = Vec::new();
    for (field, value) in [
        ("name", &payload.name),
        ("slug", &payload.slug),
        ("district", &payload.district),
    ] {
        if value.trim().is_empty() {
            missing.push(field);
        }
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    // Slugs are lowercased on write; references compare case-insensitively.
    let slug = payload.slug.trim().to_ascii_lowercase();
    if !is_valid_slug(&slug) {
        return Err(ApiError::Validation(format!(
            "slug {slug:?} must contain only lowercase letters, digits and hyphens"
        )));
    }

    let now = Utc::now();
    let location = Location {
        id: LocationId::generate(),
        name: payload.name.trim().to_string(),
        slug,
        district: payload.district.trim().to_string(),
        state: payload
            .state
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATE.to_string()),
        pincode: payload.pincode,
        is_active: true,
        description: payload.description,
        created_at: now,
        updated_at: now,
    };

    let created = location.clone();
    store.mutate(move |s| s.insert_location(location))?;
    info!(admin = %admin.username, slug = %created.slug, "location created");
    Ok(created)
}

pub fn update_location(
    store: &Store,
    admin: &AdminIdentity,
    payload: LocationUpdate,
) -> ApiResult<Location> {
    let new_slug = match &payload.slug {
        Some(slug) => {
            let slug = slug.trim().to_ascii_lowercase();
            if !is_valid_slug(&slug) {
                return Err(ApiError::Validation(format!(
                    "slug {slug:?} must contain only lowercase letters, digits and hyphens"
                )));
            }
            Some(slug)
        }
        None => None,
    };

    let updated = store.mutate(|s| {
        if let Some(slug) = &new_slug {
            if s.location_slug_taken(slug, Some(&payload.id)) {
                return Err(StoreError::Duplicate {
                    entity: "location",
                    field: "slug",
                });
            }
            // Renaming the slug would orphan every catalog entry holding the
            // old one, same as a delete would.
            let current = s
                .locations
                .get(payload.id.as_str())
                .map(|l| l.slug.clone())
                .ok_or(StoreError::NotFound { entity: "location" })?;
            if !slug.eq_ignore_ascii_case(&current) && slug_referenced(s, &current) {
                return Err(StoreError::Referenced {
                    entity: "location",
                    dependents: "catalog entries",
                });
            }
        }
        let location = s
            .locations
            .get_mut(payload.id.as_str())
            .ok_or(StoreError::NotFound { entity: "location" })?;

        if let Some(name) = payload.name {
            location.name = name;
        }
        if let Some(slug) = new_slug {
            location.slug = slug;
        }
        if let Some(district) = payload.district {
            location.district = district;
        }
        if let Some(state) = payload.state {
            location.state = state;
        }
        if let Some(pincode) = payload.pincode {
            location.pincode = Some(pincode);
        }
        if let Some(active) = payload.is_active {
            location.is_active = active;
        }
        if let Some(description) = payload.description {
            location.description = Some(description);
        }
        location.updated_at = Utc::now();
        Ok(location.clone())
    })?;
    info!(admin = %admin.username, slug = %updated.slug, "location updated");
    Ok(updated)
}

/// Delete a location, refusing while any catalog entity still lists its slug.
pub fn delete_location(store: &Store, admin: &AdminIdentity, id: &LocationId) -> ApiResult<()> {
    let slug = store.mutate(|s| {
        let slug = s
            .locations
            .get(id.as_str())
            .map(|l| l.slug.clone())
            .ok_or(StoreError::NotFound { entity: "location" })?;

        if slug_referenced(s, &slug) {
            return Err(StoreError::Referenced {
                entity: "location",
                dependents: "catalog entries",
            });
        }

        s.locations.shift_remove(id.as_str());
        Ok(slug)
    })?;
    info!(admin = %admin.username, slug = %slug, "location deleted");
    Ok(())
}

/// True when any catalog entity still lists `slug` in its location set.
fn slug_referenced(s: &crate::store::Snapshot, slug: &str) -> bool {
    s.categories
        .values()
        .any(|c| c.locations.iter().any(|l| l.eq_ignore_ascii_case(slug)))
        || s.subcategories
            .values()
            .any(|sc| sc.locations.iter().any(|l| l.eq_ignore_ascii_case(slug)))
        || s.providers
            .values()
            .any(|p| p.locations.iter().any(|l| l.eq_ignore_ascii_case(slug)))
}
