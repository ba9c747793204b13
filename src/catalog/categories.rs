//! Category CRUD. Slugs are derived from names, so renaming re-derives the
//! slug and re-checks uniqueness.

use crate::auth::AdminIdentity;
use crate::catalog::normalize_locations;
use crate::error::{require, ApiError, ApiResult};
use crate::model::{Category, CategoryCreate, CategoryId, CategoryUpdate};
use crate::slug::slugify;
use crate::store::{Store, StoreError};
use chrono::Utc;
use tracing::info;

/// Categories, newest first. `slug` narrows to a single category when given.
pub fn list_categories(store: &Store, slug: Option<&str>) -> Vec<Category> {
    store.read(|s| {
        s.categories
            .values()
            .rev()
            .filter(|c| slug.map_or(true, |want| c.slug.eq_ignore_ascii_case(want)))
            .cloned()
            .collect()
    })
}

pub fn create_category(
    store: &Store,
    admin: &AdminIdentity,
    payload: CategoryCreate,
) -> ApiResult<Category> {
    require("name", &payload.name)?;

    let now = Utc::now();
    let name = payload.name.trim().to_string();
    let category = Category {
        id: CategoryId::generate(),
        slug: slugify(&name),
        name,
        description: payload.description,
        locations: lowercase_set(payload.locations),
        created_at: now,
        updated_at: now,
    };

    let created = category.clone();
    store.mutate(move |s| s.insert_category(category))?;
    info!(admin = %admin.username, slug = %created.slug, "category created");
    Ok(created)
}

pub fn update_category(
    store: &Store,
    admin: &AdminIdentity,
    payload: CategoryUpdate,
) -> ApiResult<Category> {
    let updated = store.mutate(|s| {
        if let Some(name) = &payload.name {
            let slug = slugify(name);
            if s.category_slug_taken(&slug, Some(&payload.id)) {
                return Err(StoreError::Duplicate {
                    entity: "category",
                    field: "slug",
                });
            }
        }
        let category = s
            .categories
            .get_mut(payload.id.as_str())
            .ok_or(StoreError::NotFound { entity: "category" })?;

        if let Some(name) = payload.name {
            category.slug = slugify(&name);
            category.name = name.trim().to_string();
        }
        if let Some(description) = payload.description {
            category.description = Some(description);
        }
        if let Some(locations) = payload.locations {
            category.locations = lowercase_set(locations);
        }
        category.updated_at = Utc::now();
        Ok(category.clone())
    })?;
    info!(admin = %admin.username, slug = %updated.slug, "category updated");
    Ok(updated)
}

/// Delete a category, refusing while subcategories still reference it.
pub fn delete_category(store: &Store, admin: &AdminIdentity, id: &CategoryId) -> ApiResult<()> {
    let slug = store.mutate(|s| {
        let slug = s
            .categories
            .get(id.as_str())
            .map(|c| c.slug.clone())
            .ok_or(StoreError::NotFound { entity: "category" })?;
        if s.subcategories.values().any(|sc| &sc.category_id == id) {
            return Err(StoreError::Referenced {
                entity: "category",
                dependents: "subcategories",
            });
        }
        s.categories.shift_remove(id.as_str());
        Ok(slug)
    })?;
    info!(admin = %admin.username, slug = %slug, "category deleted");
    Ok(())
}

fn lowercase_set(locations: Vec<String>) -> Vec<String> {
    // Categories may legitimately carry an empty location set (offered
    // everywhere), so no default is injected here.
    if locations.is_empty() {
        return locations;
    }
    normalize_locations(locations, None, "")
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn admin() -> AdminIdentity {
        AdminIdentity {
            admin_id: crate::model::AdminId::generate(),
            username: "admin".into(),
        }
    }

    fn create(store: &Store, name: &str) -> ApiResult<Category> {
        create_category(
            store,
            &admin(),
            CategoryCreate {
                name: name.into(),
                description: None,
                locations: vec![],
            },
        )
    }

    #[test]
    fn slug_is_derived_from_name() {
        let store = Store::in_memory();
        let category = create(&store, "Home Services").unwrap();
        assert_eq!(category.slug, "home-services");
    }

    #[test]
    fn same_name_twice_fails_second_time() {
        let store = Store::in_memory();
        create(&store, "Home Services").unwrap();
        let err = create(&store, "Home Services").unwrap_err();
        assert_matches!(err, ApiError::Duplicate { entity: "category", field: "slug" });
        assert_eq!(store.read(|s| s.categories.len()), 1);
    }

    #[test]
    fn rename_rederives_slug_and_checks_uniqueness() {
        let store = Store::in_memory();
        create(&store, "Home Services").unwrap();
        let other = create(&store, "Cleaning").unwrap();

        let err = update_category(
            &store,
            &admin(),
            CategoryUpdate {
                id: other.id.clone(),
                name: Some("Home Services".into()),
                description: None,
                locations: None,
            },
        )
        .unwrap_err();
        assert_matches!(err, ApiError::Duplicate { .. });

        let renamed = update_category(
            &store,
            &admin(),
            CategoryUpdate {
                id: other.id,
                name: Some("Deep Cleaning".into()),
                description: None,
                locations: None,
            },
        )
        .unwrap();
        assert_eq!(renamed.slug, "deep-cleaning");
    }

    #[test]
    fn rename_to_own_name_is_allowed() {
        let store = Store::in_memory();
        let category = create(&store, "Home Services").unwrap();
        let same = update_category(
            &store,
            &admin(),
            CategoryUpdate {
                id: category.id,
                name: Some("Home Services".into()),
                description: Some("updated".into()),
                locations: None,
            },
        )
        .unwrap();
        assert_eq!(same.slug, "home-services");
        assert_eq!(same.description.as_deref(), Some("updated"));
    }

    #[test]
    fn list_newest_first_with_slug_filter() {
        let store = Store::in_memory();
        create(&store, "First").unwrap();
        create(&store, "Second").unwrap();

        let all = list_categories(&store, None);
        assert_eq!(all[0].name, "Second");
        assert_eq!(all[1].name, "First");

        let filtered = list_categories(&store, Some("first"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].slug, "first");
    }
}
