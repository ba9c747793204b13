//! Slug derivation and validation.
//!
//! Slugs are the stable, human-readable keys the catalog hangs together on:
//! lowercase alphanumerics with single hyphens between words, unique per
//! collection.

use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid")
});

/// Derive a slug from a display name: lowercase, non-alphanumeric runs folded
/// to single hyphens, no leading or trailing hyphen.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    out
}

pub fn is_valid_slug(candidate: &str) -> bool {
    SLUG_RE.is_match(candidate)
}
