//! Demo data seeding: resets the catalog to a known fixture set so a fresh
//! deployment has something to show. Bookings, contact messages, and admin
//! accounts are left untouched.

use crate::auth::AdminIdentity;
use crate::config::ServerConfig;
use crate::error::ApiResult;
use crate::model::{
    Category, CategoryId, Location, LocationId, Provider, ProviderId, Subcategory, SubcategoryId,
};
use crate::slug::slugify;
use crate::store::Store;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub locations: usize,
    pub categories: usize,
    pub subcategories: usize,
    pub providers: usize,
}

const CATEGORIES: &[(&str, &[(&str, f64)])] = &[
    (
        "Home Services",
        &[
            ("Plumbing Services", 200.0),
            ("Electrical Repair", 250.0),
            ("AC Service & Repair", 400.0),
            ("Painting", 500.0),
        ],
    ),
    (
        "Cleaning",
        &[("Deep Cleaning", 999.0), ("Sofa Cleaning", 349.0)],
    ),
    (
        "Appliance Repair",
        &[("Washing Machine Repair", 300.0), ("Fridge Repair", 350.0)],
    ),
];

/// Replace the catalog with the demo fixture set.
pub fn seed_demo_data(
    store: &Store,
    admin: &AdminIdentity,
    config: &ServerConfig,
) -> ApiResult<SeedSummary> {
    let home = config.default_location.clone();
    let now = Utc::now();

    let summary = store.mutate(|s| {
        s.locations.clear();
        s.categories.clear();
        s.subcategories.clear();
        s.providers.clear();

        let location_id = LocationId::generate();
        s.locations.insert(
            location_id.to_string(),
            Location {
                id: location_id,
                name: title_case(&home),
                slug: home.clone(),
                district: title_case(&home),
                state: "Kerala".into(),
                pincode: None,
                is_active: true,
                description: None,
                created_at: now,
                updated_at: now,
            },
        );

        let mut first_subcategories: Vec<SubcategoryId> = Vec::new();
        for (category_name, subs) in CATEGORIES {
            let category_id = CategoryId::generate();
            s.categories.insert(
                category_id.to_string(),
                Category {
                    id: category_id.clone(),
                    name: category_name.to_string(),
                    slug: slugify(category_name),
                    description: None,
                    locations: vec![home.clone()],
                    created_at: now,
                    updated_at: now,
                },
            );
            for (sub_name, min_charge) in *subs {
                let sub_id = SubcategoryId::generate();
                if first_subcategories.len() < 2 {
                    first_subcategories.push(sub_id.clone());
                }
                s.subcategories.insert(
                    sub_id.to_string(),
                    Subcategory {
                        id: sub_id,
                        category_id: category_id.clone(),
                        name: sub_name.to_string(),
                        slug: slugify(sub_name),
                        description: None,
                        rates: vec![format!("starting at ₹{min_charge}")],
                        min_charge: *min_charge,
                        locations: vec![home.clone()],
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }

        for (name, phone) in [
            ("Rajesh Kumar", "+919876500001"),
            ("Anoop Varma", "+919876500002"),
        ] {
            let provider_id = ProviderId::generate();
            s.providers.insert(
                provider_id.to_string(),
                Provider {
                    id: provider_id,
                    name: name.to_string(),
                    phone: phone.to_string(),
                    subcategory_ids: first_subcategories.clone(),
                    locations: vec![home.clone()],
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        Ok(SeedSummary {
            locations: s.locations.len(),
            categories: s.categories.len(),
            subcategories: s.subcategories.len(),
            providers: s.providers.len(),
        })
    })?;

    info!(
        admin = %admin.username,
        categories = summary.categories,
        subcategories = summary.subcategories,
        "demo data seeded"
    );
    Ok(summary)
}

fn title_case(slug: &str) -> String {
    let mut chars = slug.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CliArgs, ServerConfig};
    use crate::model::{BookingCreate, SubcategoryId};

    fn admin() -> AdminIdentity {
        AdminIdentity {
            admin_id: crate::model::AdminId::generate(),
            username: "admin".into(),
        }
    }

    fn config() -> ServerConfig {
        ServerConfig::from_args(CliArgs {
            admin_password: Some("secret".into()),
            ..CliArgs::default()
        })
        .unwrap()
    }

    #[test]
    fn seed_populates_the_catalog() {
        let store = Store::in_memory();
        let summary = seed_demo_data(&store, &admin(), &config()).unwrap();
        assert_eq!(summary.locations, 1);
        assert_eq!(summary.categories, 3);
        assert_eq!(summary.subcategories, 8);
        assert_eq!(summary.providers, 2);

        let views = crate::catalog::resolver::resolve_subcategories(
            &store,
            None,
            Some("malappuram"),
        );
        assert_eq!(views.len(), 8);
        assert!(views.iter().all(|v| v.category.is_some()));
    }

    #[test]
    fn reseeding_replaces_catalog_but_keeps_bookings() {
        let store = Store::in_memory();
        seed_demo_data(&store, &admin(), &config()).unwrap();

        let subcategory_id: SubcategoryId = store.read(|s| {
            s.subcategories
                .values()
                .next()
                .map(|sc| sc.id.clone())
                .unwrap()
        });
        crate::booking::create_booking(
            &store,
            BookingCreate {
                subcategory_id: Some(subcategory_id),
                user_name: "Asha".into(),
                phone: "+919876543210".into(),
                location: "Malappuram town".into(),
                notes: None,
            },
        )
        .unwrap();

        let again = seed_demo_data(&store, &admin(), &config()).unwrap();
        assert_eq!(again.subcategories, 8);
        assert_eq!(store.read(|s| s.bookings.len()), 1);
    }
}
