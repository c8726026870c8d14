//! Identifier derivation for exercises and imported routines.

/// Prefix of routines created by the importer
pub const IMPORTED_ROUTINE_PREFIX: &str = "imported-";

/// Derive an id from a display name.
///
/// Lowercases the name and collapses every run of whitespace into a single
/// hyphen. Leading and trailing whitespace is not trimmed, so `" Row"` becomes
/// `"-row"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
                in_whitespace = true;
            }
        } else {
            slug.extend(ch.to_lowercase());
            in_whitespace = false;
        }
    }

    slug
}

/// Id of the routine that collects imported exercises of a category
pub fn routine_id_for_category(category: &str) -> String {
    format!("{}{}", IMPORTED_ROUTINE_PREFIX, slugify(category))
}
