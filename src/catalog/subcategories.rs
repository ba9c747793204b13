//! Subcategory CRUD: the bookable service units.
//!
//! A subcategory always belongs to an existing category, carries a
//! non-negative minimum charge, and has a non-empty location set (the
//! configured home location is the fallback).

use crate::auth::AdminIdentity;
use crate::catalog::normalize_locations;
use crate::catalog::resolver::populate_subcategory;
use crate::error::{ApiError, ApiResult};
use crate::model::{Subcategory, SubcategoryCreate, SubcategoryId, SubcategoryUpdate, SubcategoryView};
use crate::slug::slugify;
use crate::store::{Store, StoreError};
use chrono::Utc;
use tracing::info;

pub fn create_subcategory(
    store: &Store,
    admin: &AdminIdentity,
    payload: SubcategoryCreate,
    default_location: &str,
) -> ApiResult<SubcategoryView> {
    let mut missing = Vec::new();
    if payload.category_id.is_none() {
        missing.push("categoryId");
    }
    if payload.name.trim().is_empty() {
        missing.push("name");
    }
    if payload.min_charge.is_none() {
        missing.push("minCharge");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }
    let category_id = payload.category_id.expect("checked above");
    let min_charge = payload.min_charge.expect("checked above");
    if !min_charge.is_finite() || min_charge < 0.0 {
        return Err(ApiError::Validation(
            "minCharge must be a non-negative number".into(),
        ));
    }

    let now = Utc::now();
    let name = payload.name.trim().to_string();
    let subcategory = Subcategory {
        id: SubcategoryId::generate(),
        category_id,
        slug: slugify(&name),
        name,
        description: payload.description,
        rates: payload.rates,
        min_charge,
        locations: normalize_locations(payload.locations, payload.location, default_location),
        created_at: now,
        updated_at: now,
    };

    let view = store.mutate(|s| {
        // Parent must exist before the insert; check and insert share one
        // critical section.
        if !s.categories.contains_key(subcategory.category_id.as_str()) {
            return Err(StoreError::NotFound { entity: "category" });
        }
        s.insert_subcategory(subcategory.clone())?;
        Ok(populate_subcategory(s, subcategory.clone()))
    })?;
    info!(admin = %admin.username, slug = %view.subcategory.slug, "subcategory created");
    Ok(view)
}

pub fn update_subcategory(
    store: &Store,
    admin: &AdminIdentity,
    payload: SubcategoryUpdate,
    default_location: &str,
) -> ApiResult<SubcategoryView> {
    let mut missing = Vec::new();
    if payload.category_id.is_none() {
        missing.push("categoryId");
    }
    if payload.name.trim().is_empty() {
        missing.push("name");
    }
    if payload.min_charge.is_none() {
        missing.push("minCharge");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }
    let category_id = payload.category_id.expect("checked above");
    let min_charge = payload.min_charge.expect("checked above");
    if !min_charge.is_finite() || min_charge < 0.0 {
        return Err(ApiError::Validation(
            "minCharge must be a non-negative number".into(),
        ));
    }

    let name = payload.name.trim().to_string();
    let slug = slugify(&name);
    let locations = normalize_locations(payload.locations, payload.location, default_location);

    let view = store.mutate(|s| {
        if !s.categories.contains_key(category_id.as_str()) {
            return Err(StoreError::NotFound { entity: "category" });
        }
        if s.subcategory_slug_taken(&slug, Some(&payload.id)) {
            return Err(StoreError::Duplicate {
                entity: "subcategory",
                field: "slug",
            });
        }
        let subcategory = s
            .subcategories
            .get_mut(payload.id.as_str())
            .ok_or(StoreError::NotFound {
                entity: "subcategory",
            })?;

        subcategory.category_id = category_id.clone();
        subcategory.name = name.clone();
        subcategory.slug = slug.clone();
        subcategory.description = payload.description.clone();
        subcategory.rates = payload.rates.clone();
        subcategory.min_charge = min_charge;
        subcategory.locations = locations.clone();
        subcategory.updated_at = Utc::now();
        let updated = subcategory.clone();
        Ok(populate_subcategory(s, updated))
    })?;
    info!(admin = %admin.username, slug = %view.subcategory.slug, "subcategory updated");
    Ok(view)
}

/// Delete a subcategory, refusing while providers still list it. Existing
/// bookings keep their id reference; their views simply lose the populated
/// name.
pub fn delete_subcategory(
    store: &Store,
    admin: &AdminIdentity,
    id: &SubcategoryId,
) -> ApiResult<()> {
    let slug = store.mutate(|s| {
        let slug = s
            .subcategories
            .get(id.as_str())
            .map(|sc| sc.slug.clone())
            .ok_or(StoreError::NotFound {
                entity: "subcategory",
            })?;
        if s.providers
            .values()
            .any(|p| p.subcategory_ids.iter().any(|sid| sid == id))
        {
            return Err(StoreError::Referenced {
                entity: "subcategory",
                dependents: "providers",
            });
        }
        s.subcategories.shift_remove(id.as_str());
        Ok(slug)
    })?;
    info!(admin = %admin.username, slug = %slug, "subcategory deleted");
    Ok(())
}
