//! Provider CRUD. Providers are admin-facing records linking people to the
//! subcategories they service; customers never see them directly.

use crate::auth::AdminIdentity;
use crate::catalog::normalize_locations;
use crate::catalog::resolver::subcategory_ref;
use crate::error::{ApiError, ApiResult};
use crate::model::{Provider, ProviderCreate, ProviderId, ProviderUpdate, ProviderView};
use crate::store::{Snapshot, Store, StoreError};
use chrono::Utc;
use tracing::info;

/// Providers, newest first, with their subcategory references populated.
pub fn list_providers(store: &Store, _admin: &AdminIdentity) -> Vec<ProviderView> {
    store.read(|s| {
        s.providers
            .values()
            .rev()
            .map(|p| populate_provider(s, p.clone()))
            .collect()
    })
}

pub fn create_provider(
    store: &Store,
    admin: &AdminIdentity,
    payload: ProviderCreate,
    default_location: &str,
) -> ApiResult<ProviderView> {
    let mut missing = Vec::new();
    if payload.name.trim().is_empty() {
        missing.push("name");
    }
    if payload.phone.trim().is_empty() {
        missing.push("phone");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    let now = Utc::now();
    let provider = Provider {
        id: ProviderId::generate(),
        name: payload.name.trim().to_string(),
        phone: payload.phone.trim().to_string(),
        subcategory_ids: payload.subcategory_ids,
        locations: normalize_locations(payload.locations, payload.location, default_location),
        is_active: payload.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    let view = store.mutate(|s| {
        // Every listed subcategory must exist at insert time.
        for id in &provider.subcategory_ids {
            if !s.subcategories.contains_key(id.as_str()) {
                return Err(StoreError::NotFound {
                    entity: "subcategory",
                });
            }
        }
        s.insert_provider(provider.clone());
        Ok(populate_provider(s, provider.clone()))
    })?;
    info!(admin = %admin.username, name = %view.provider.name, "provider created");
    Ok(view)
}

pub fn update_provider(
    store: &Store,
    admin: &AdminIdentity,
    payload: ProviderUpdate,
    default_location: &str,
) -> ApiResult<ProviderView> {
    let mut missing = Vec::new();
    if payload.name.trim().is_empty() {
        missing.push("name");
    }
    if payload.phone.trim().is_empty() {
        missing.push("phone");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    let locations = normalize_locations(payload.locations, payload.location, default_location);

    let view = store.mutate(|s| {
        for id in &payload.subcategory_ids {
            if !s.subcategories.contains_key(id.as_str()) {
                return Err(StoreError::NotFound {
                    entity: "subcategory",
                });
            }
        }
        let provider = s
            .providers
            .get_mut(payload.id.as_str())
            .ok_or(StoreError::NotFound { entity: "provider" })?;

        provider.name = payload.name.trim().to_string();
        provider.phone = payload.phone.trim().to_string();
        provider.subcategory_ids = payload.subcategory_ids.clone();
        provider.locations = locations.clone();
        if let Some(active) = payload.is_active {
            provider.is_active = active;
        }
        provider.updated_at = Utc::now();
        let updated = provider.clone();
        Ok(populate_provider(s, updated))
    })?;
    info!(admin = %admin.username, name = %view.provider.name, "provider updated");
    Ok(view)
}

pub fn delete_provider(store: &Store, admin: &AdminIdentity, id: &ProviderId) -> ApiResult<()> {
    let name = store.mutate(|s| {
        let name = s
            .providers
            .get(id.as_str())
            .map(|p| p.name.clone())
            .ok_or(StoreError::NotFound { entity: "provider" })?;
        s.providers.shift_remove(id.as_str());
        Ok(name)
    })?;
    info!(admin = %admin.username, name = %name, "provider deleted");
    Ok(())
}

fn populate_provider(snapshot: &Snapshot, provider: Provider) -> ProviderView {
    let subcategories = provider
        .subcategory_ids
        .iter()
        .filter_map(|id| subcategory_ref(snapshot, id.as_str()))
        .collect();
    ProviderView {
        provider,
        subcategories,
    }
}
