//! Catalog: location registry, admin CRUD, and the location-scoped resolver.

pub mod categories;
pub mod locations;
pub mod providers;
pub mod resolver;
pub mod subcategories;

/// Normalize a location set: lowercase to slug form, fold the legacy singular
/// `location` field into the list, drop empties and duplicates, and fall back
/// to `default_location` when nothing remains. The result is never empty.
pub(crate) fn normalize_locations(
    locations: Vec<String>,
    legacy_singular: Option<String>,
    default_location: &str,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let candidates = locations.into_iter().chain(legacy_singular);
    for candidate in candidates {
        let slug = candidate.trim().to_ascii_lowercase();
        if slug.is_empty() || out.contains(&slug) {
            continue;
        }
        out.push(slug);
    }
    if out.is_empty() {
        out.push(default_location.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_falls_back_to_default() {
        assert_eq!(
            normalize_locations(vec![], None, "malappuram"),
            vec!["malappuram"]
        );
    }

    #[test]
    fn legacy_singular_is_folded_in() {
        assert_eq!(
            normalize_locations(vec![], Some("Calicut".into()), "malappuram"),
            vec!["calicut"]
        );
        assert_eq!(
            normalize_locations(
                vec!["malappuram".into()],
                Some("malappuram".into()),
                "malappuram"
            ),
            vec!["malappuram"]
        );
    }

    #[test]
    fn lowercases_and_dedupes() {
        assert_eq!(
            normalize_locations(
                vec!["Calicut".into(), "calicut".into(), " tirur ".into(), "".into()],
                None,
                "malappuram"
            ),
            vec!["calicut", "tirur"]
        );
    }
}
