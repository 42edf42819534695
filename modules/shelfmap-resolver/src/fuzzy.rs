//! Fuzzy category-name matching.
//!
//! When no persisted mapping exists for a platform string, this module tries
//! to land it on the canonical tree by name alone. Variants are generated in
//! a fixed order and the first hit wins; match results are advisory and are
//! never written back to the store.

use std::collections::HashSet;

use shelfmap_common::normalize_name;
use shelfmap_store::Category;

/// Leading words dropped when generating the filler variant.
const LEADING_FILLERS: [&str; 5] = ["all", "the", "new", "best", "top"];

/// Trailing generic suffixes dropped when generating the filler variant.
const TRAILING_SUFFIXES: [&str; 4] = ["devices", "products", "items", "accessories"];

/// Generate match candidates for a raw category string, most to least
/// literal: the normalized input itself, then the singular/plural toggle,
/// then filler and suffix stripping, then hyphen/space swapping. Empty and
/// duplicate candidates are dropped while preserving order.
pub fn fuzzy_variants(raw: &str) -> Vec<String> {
    let normalized = normalize_name(raw);
    if normalized.is_empty() {
        return Vec::new();
    }
    let mut variants = vec![normalized.clone()];

    match normalized.strip_suffix('s') {
        Some(singular) => variants.push(singular.to_string()),
        None => variants.push(format!("{normalized}s")),
    }

    variants.push(strip_fillers(&normalized));

    if normalized.contains('-') {
        variants.push(normalized.replace('-', " "));
    } else if normalized.contains(' ') {
        variants.push(normalized.replace(' ', "-"));
    }

    let mut seen = HashSet::new();
    variants
        .into_iter()
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

fn strip_fillers(normalized: &str) -> String {
    let mut words: Vec<&str> = normalized.split_whitespace().collect();
    while words.first().is_some_and(|w| LEADING_FILLERS.contains(w)) {
        words.remove(0);
    }
    while words.last().is_some_and(|w| TRAILING_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

/// Match a raw platform string against the category list. An exact
/// case-insensitive name match is tried before any variant, so `"Laptops"`
/// lands on a category named `"Laptops"` even when one named
/// `"Laptop Accessories"` sorts earlier. Variants are then tried in order,
/// each as an exact or prefix candidate, and the first hit wins.
pub fn match_category<'a>(raw: &str, categories: &'a [Category]) -> Option<&'a Category> {
    let normalized = normalize_name(raw);
    if normalized.is_empty() {
        return None;
    }

    if let Some(exact) = categories
        .iter()
        .find(|c| c.name.to_lowercase() == normalized)
    {
        return Some(exact);
    }

    for variant in fuzzy_variants(raw) {
        if let Some(hit) = categories
            .iter()
            .find(|c| c.name.to_lowercase().starts_with(variant.as_str()))
        {
            return Some(hit);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn category(name: &str, parent: Option<&Category>) -> Category {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let (parent_id, level, path) = match parent {
            None => (None, 0, Vec::new()),
            Some(p) => {
                let mut path = p.path.clone();
                path.push(p.id);
                (Some(p.id), p.level + 1, path)
            }
        };
        Category {
            id,
            name: name.to_string(),
            parent_id,
            level,
            path,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn variants_cover_plural_filler_and_hyphen_forms() {
        assert_eq!(fuzzy_variants("Laptops"), vec!["laptops", "laptop"]);
        assert_eq!(
            fuzzy_variants("All Smart-Home Devices"),
            vec![
                "all smart-home devices",
                "all smart-home device",
                "smart-home",
                "all smart home devices",
            ]
        );
        assert_eq!(fuzzy_variants("   "), Vec::<String>::new());
    }

    #[test]
    fn plural_input_matches_singular_category() {
        let electronics = category("Electronics", None);
        let laptop = category("Laptop", Some(&electronics));
        let list = vec![electronics, laptop];

        let hit = match_category("Laptops", &list).unwrap();
        assert_eq!(hit.name, "Laptop");
    }

    #[test]
    fn exact_name_beats_prefix_of_an_earlier_row() {
        let accessories = category("Laptop Accessories", None);
        let laptops = category("Laptops", None);
        let list = vec![accessories, laptops];

        let hit = match_category("laptops", &list).unwrap();
        assert_eq!(hit.name, "Laptops");
    }

    #[test]
    fn filler_words_are_ignored() {
        let audio = category("Audio", None);
        let list = vec![audio];

        let hit = match_category("All Audio Devices", &list).unwrap();
        assert_eq!(hit.name, "Audio");
    }

    #[test]
    fn hyphen_and_space_forms_are_interchangeable() {
        let smart_home = category("Smart Home", None);
        let list = vec![smart_home];

        let hit = match_category("Smart-Home", &list).unwrap();
        assert_eq!(hit.name, "Smart Home");
    }

    #[test]
    fn unmatchable_input_returns_none() {
        let electronics = category("Electronics", None);
        let list = vec![electronics];

        assert!(match_category("Garden Furniture", &list).is_none());
        assert!(match_category("", &list).is_none());
    }
}
