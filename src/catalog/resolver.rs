//! Catalog Resolver: answers "what is visible at location L".
//!
//! A subcategory is visible at a location iff its location set contains that
//! slug. With no location supplied the resolver is filter-neutral and returns
//! unfiltered results; any default location is the presentation layer's
//! concern, not the resolver's.

use crate::error::{ApiError, ApiResult};
use crate::model::{Category, CategoryId, RefView, Subcategory, SubcategoryView};
use crate::store::{Snapshot, Store};

pub fn resolve_category(store: &Store, slug: &str) -> ApiResult<Category> {
    store
        .read(|s| {
            s.categories
                .values()
                .find(|c| c.slug.eq_ignore_ascii_case(slug))
                .cloned()
        })
        .ok_or(ApiError::NotFound { entity: "category" })
}

/// Subcategories, newest first, optionally narrowed by category and location.
pub fn resolve_subcategories(
    store: &Store,
    category_id: Option<&CategoryId>,
    location: Option<&str>,
) -> Vec<SubcategoryView> {
    store.read(|s| {
        s.subcategories
            .values()
            .rev()
            .filter(|sc| category_id.map_or(true, |want| &sc.category_id == want))
            .filter(|sc| {
                location.map_or(true, |want| {
                    sc.locations.iter().any(|l| l.eq_ignore_ascii_case(want))
                })
            })
            .map(|sc| populate_subcategory(s, sc.clone()))
            .collect()
    })
}

pub fn resolve_subcategory_by_slug(store: &Store, slug: &str) -> ApiResult<SubcategoryView> {
    store
        .read(|s| {
            s.subcategories
                .values()
                .find(|sc| sc.slug.eq_ignore_ascii_case(slug))
                .map(|sc| populate_subcategory(s, sc.clone()))
        })
        .ok_or(ApiError::NotFound {
            entity: "subcategory",
        })
}

/// Materialize the parent category `{name, slug}` onto a subcategory.
pub(crate) fn populate_subcategory(snapshot: &Snapshot, sub: Subcategory) -> SubcategoryView {
    let category = snapshot
        .categories
        .get(sub.category_id.as_str())
        .map(|c| RefView {
            id: c.id.to_string(),
            name: c.name.clone(),
            slug: c.slug.clone(),
        });
    SubcategoryView {
        subcategory: sub,
        category,
    }
}

/// Materialize a subcategory `{name, slug}` reference, used by booking and
/// provider views.
pub(crate) fn subcategory_ref(snapshot: &Snapshot, id: &str) -> Option<RefView> {
    snapshot.subcategories.get(id).map(|sc| RefView {
        id: sc.id.to_string(),
        name: sc.name.clone(),
        slug: sc.slug.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AdminIdentity;
    use crate::catalog::{categories, subcategories};
    use crate::model::{CategoryCreate, SubcategoryCreate};
    use assert_matches::assert_matches;

    fn admin() -> AdminIdentity {
        AdminIdentity {
            admin_id: crate::model::AdminId::generate(),
            username: "admin".into(),
        }
    }

    fn seed(store: &Store) -> CategoryId {
        let category = categories::create_category(
            store,
            &admin(),
            CategoryCreate {
                name: "Home Services".into(),
                description: None,
                locations: vec!["malappuram".into(), "calicut".into()],
            },
        )
        .unwrap();

        for (name, locations) in [
            ("Plumbing Services", vec!["malappuram".to_string()]),
            ("Electrical Repair", vec!["calicut".to_string()]),
            (
                "AC Service",
                vec!["malappuram".to_string(), "calicut".to_string()],
            ),
        ] {
            subcategories::create_subcategory(
                store,
                &admin(),
                SubcategoryCreate {
                    category_id: Some(category.id.clone()),
                    name: name.into(),
                    min_charge: Some(150.0),
                    locations,
                    ..SubcategoryCreate::default()
                },
                "malappuram",
            )
            .unwrap();
        }
        category.id
    }

    #[test]
    fn location_scoping_invariant_holds() {
        let store = Store::in_memory();
        let category_id = seed(&store);

        let at_malappuram = resolve_subcategories(&store, Some(&category_id), Some("malappuram"));
        let slugs: Vec<&str> = at_malappuram
            .iter()
            .map(|v| v.subcategory.slug.as_str())
            .collect();
        assert_eq!(slugs, ["ac-service", "plumbing-services"]);

        // A subcategory scoped only to calicut must never surface here.
        assert!(!slugs.contains(&"electrical-repair"));
    }

    #[test]
    fn no_location_means_unfiltered() {
        let store = Store::in_memory();
        let category_id = seed(&store);
        let all = resolve_subcategories(&store, Some(&category_id), None);
        assert_eq!(all.len(), 3);
        // Newest first.
        assert_eq!(all[0].subcategory.slug, "ac-service");
        assert_eq!(all[2].subcategory.slug, "plumbing-services");
    }

    #[test]
    fn location_filter_is_case_insensitive() {
        let store = Store::in_memory();
        let category_id = seed(&store);
        let views = resolve_subcategories(&store, Some(&category_id), Some("Malappuram"));
        assert_eq!(views.len(), 2);
    }

    #[test]
    fn unknown_location_yields_empty() {
        let store = Store::in_memory();
        let category_id = seed(&store);
        assert!(resolve_subcategories(&store, Some(&category_id), Some("kochi")).is_empty());
    }

    #[test]
    fn resolve_category_by_slug() {
        let store = Store::in_memory();
        seed(&store);
        let category = resolve_category(&store, "home-services").unwrap();
        assert_eq!(category.name, "Home Services");
        assert_matches!(
            resolve_category(&store, "nope"),
            Err(ApiError::NotFound { entity: "category" })
        );
    }

    #[test]
    fn resolve_subcategory_by_slug_populates_parent() {
        let store = Store::in_memory();
        seed(&store);
        let view = resolve_subcategory_by_slug(&store, "plumbing-services").unwrap();
        assert_eq!(view.category.unwrap().slug, "home-services");
        assert_matches!(
            resolve_subcategory_by_slug(&store, "nope"),
            Err(ApiError::NotFound { entity: "subcategory" })
        );
    }
}
