//! Favorite-set arithmetic and listing id validation.
//!
//! The favorite set is stored as an ordered sequence of listing ids. Adding
//! appends at the end only when the id is absent; removing filters every
//! occurrence. Both are idempotent.

use std::sync::LazyLock;

use regex::Regex;

static LISTING_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid listing id regex"));

/// True if `id` is a well-formed listing identifier.
pub fn is_valid_listing_id(id: &str) -> bool {
    LISTING_ID_RE.is_match(id)
}

/// Favorite sequence with `listing_id` appended, unless already present.
pub fn with_favorite(favorites: &[String], listing_id: &str) -> Vec<String> {
    let mut next = favorites.to_vec();
    if !next.iter().any(|id| id == listing_id) {
        next.push(listing_id.to_string());
    }
    next
}

/// Favorite sequence with every occurrence of `listing_id` removed.
pub fn without_favorite(favorites: &[String], listing_id: &str) -> Vec<String> {
    favorites
        .iter()
        .filter(|id| id.as_str() != listing_id)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_skips_existing_member() {
        let favorites = ids(&["a", "b"]);
        assert_eq!(with_favorite(&favorites, "b"), ids(&["a", "b"]));
        assert_eq!(with_favorite(&favorites, "c"), ids(&["a", "b", "c"]));
    }

    #[test]
    fn remove_is_idempotent() {
        let favorites = ids(&["a", "b", "a"]);
        let once = without_favorite(&favorites, "a");
        let twice = without_favorite(&once, "a");
        assert_eq!(once, ids(&["b"]));
        assert_eq!(once, twice);
    }

    #[test]
    fn remove_of_non_member_is_noop() {
        let favorites = ids(&["a"]);
        assert_eq!(without_favorite(&favorites, "z"), favorites);
    }

    #[test]
    fn add_then_remove_restores_set() {
        let favorites = ids(&["x", "y"]);
        let restored = without_favorite(&with_favorite(&favorites, "z"), "z");
        let before: BTreeSet<_> = favorites.iter().collect();
        let after: BTreeSet<_> = restored.iter().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn listing_id_shape() {
        assert!(is_valid_listing_id("64b7f0c2a1d3e4f5a6b7c8d9"));
        assert!(is_valid_listing_id("listing_1"));
        assert!(!is_valid_listing_id(""));
        assert!(!is_valid_listing_id("../etc"));
        assert!(!is_valid_listing_id(&"a".repeat(65)));
    }
}
