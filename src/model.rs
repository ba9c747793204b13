//! Entity, payload, and response types for the marketplace.
//!
//! Wire names follow the camelCase convention of the public API
//! (`userName`, `subcategoryId`, `minCharge`, `isActive`). Storage stays
//! normalized: entities hold ids only, and the `*View` types materialize the
//! referenced `{name, slug}` pairs in the read path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(LocationId);
entity_id!(CategoryId);
entity_id!(SubcategoryId);
entity_id!(ProviderId);
entity_id!(BookingId);
entity_id!(AdminId);
entity_id!(ContactMessageId);

// =============================================================================
// ENTITIES
// =============================================================================

/// A canonical service location customers can scope the catalog to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    /// Unique, lowercase; referenced by catalog location sets.
    pub slug: String,
    pub district: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Location slugs this category is offered in.
    #[serde(default)]
    pub locations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text price bands shown to customers.
    #[serde(default)]
    pub rates: Vec<String>,
    pub min_charge: f64,
    /// Non-empty; defaults to the configured home location.
    pub locations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub subcategory_ids: Vec<SubcategoryId>,
    #[serde(default)]
    pub locations: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking status lifecycle. Creation always starts at `Pending`; admins may
/// move a booking to any other status, including backwards. The wire strings
/// are exactly `Pending`, `In Progress`, `Completed`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum BookingStatus {
    Pending,
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    Completed,
}

impl BookingStatus {
    /// Parse a caller-supplied status string; anything outside the closed
    /// enumeration is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::from_str(raw).ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub subcategory_id: SubcategoryId,
    pub user_name: String,
    pub phone: String,
    /// Free-text customer address, distinct from the Location entity.
    pub location: String,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: AdminId,
    pub username: String,
    /// Hex-encoded SHA-256 digest. Persisted in the snapshot; API responses
    /// use [`AdminView`] instead so the digest never leaves the store.
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// REQUEST PAYLOADS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub district: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub id: LocationId,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCreate {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub id: CategoryId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub locations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryCreate {
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub rates: Vec<String>,
    pub min_charge: Option<f64>,
    #[serde(default)]
    pub locations: Vec<String>,
    /// Legacy singular form, folded into `locations` on ingest.
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryUpdate {
    pub id: SubcategoryId,
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub rates: Vec<String>,
    pub min_charge: Option<f64>,
    #[serde(default)]
    pub locations: Vec<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subcategory_ids: Vec<SubcategoryId>,
    #[serde(default)]
    pub locations: Vec<String>,
    /// Legacy singular form, folded into `locations` on ingest.
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUpdate {
    pub id: ProviderId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subcategory_ids: Vec<SubcategoryId>,
    #[serde(default)]
    pub locations: Vec<String>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreate {
    pub subcategory_id: Option<SubcategoryId>,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusUpdate {
    pub id: BookingId,
    #[serde(default)]
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessageCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// MATERIALIZED VIEWS
// =============================================================================

/// `{id, name, slug}` of a referenced entity, populated in the read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefView {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryView {
    #[serde(flatten)]
    pub subcategory: Subcategory,
    /// Parent category `{name, slug}`, absent if the reference dangles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<RefView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<RefView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    #[serde(flatten)]
    pub provider: Provider,
    pub subcategories: Vec<RefView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub id: AdminId,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn booking_status_wire_strings() {
        assert_eq!(BookingStatus::Pending.to_string(), "Pending");
        assert_eq!(BookingStatus::InProgress.to_string(), "In Progress");
        assert_eq!(BookingStatus::Completed.to_string(), "Completed");
    }

    #[test]
    fn booking_status_parse_round_trips() {
        for status in BookingStatus::iter() {
            assert_eq!(BookingStatus::parse(&status.to_string()), Some(status));
        }
        assert_eq!(BookingStatus::parse("Cancelled"), None);
        assert_eq!(BookingStatus::parse("pending"), None);
        assert_eq!(BookingStatus::parse(""), None);
    }

    #[test]
    fn booking_status_serde_matches_strum() {
        let json = serde_json::to_string(&BookingStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let back: BookingStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(back, BookingStatus::InProgress);
    }

    #[test]
    fn entity_ids_are_unique() {
        assert_ne!(BookingId::generate(), BookingId::generate());
    }

    #[test]
    fn subcategory_create_accepts_legacy_singular_location() {
        let payload: SubcategoryCreate = serde_json::from_str(
            r#"{"categoryId":"c1","name":"Plumbing","minCharge":200,"location":"malappuram"}"#,
        )
        .unwrap();
        assert!(payload.locations.is_empty());
        assert_eq!(payload.location.as_deref(), Some("malappuram"));
    }
}
