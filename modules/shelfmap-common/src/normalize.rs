/// Normalize a raw scraped string into a stable lookup key:
/// trimmed and lowercased. Brand and category cache keys, the
/// `brands.normalized_name` column, and every case-insensitive
/// comparison in the resolvers go through this.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(normalize_name("  Sony Electronics  "), "sony electronics");
        assert_eq!(normalize_name("ANKER"), "anker");
    }

    #[test]
    fn preserves_interior_whitespace_and_punctuation() {
        assert_eq!(normalize_name("Black & Decker"), "black & decker");
        assert_eq!(normalize_name("gaming-chairs"), "gaming-chairs");
    }

    #[test]
    fn handles_non_ascii() {
        assert_eq!(normalize_name(" Häagen-Dazs "), "häagen-dazs");
    }

    #[test]
    fn empty_after_trim_stays_empty() {
        assert_eq!(normalize_name("   "), "");
    }
}
