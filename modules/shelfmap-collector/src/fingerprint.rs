//! Content fingerprints and dedup keys.
//!
//! The source gives no reliable "loading complete" signal between pages, so
//! the collector compares batch fingerprints to detect genuine change, and
//! no true pagination offset, so a stable per-record key stands in for one.

use crate::source::RawReview;

/// How many characters of a record's text participate in fingerprints and
/// stable keys.
pub const TEXT_PREFIX_LEN: usize = 50;

/// First [`TEXT_PREFIX_LEN`] characters of a text, on char boundaries.
pub fn text_prefix(text: &str) -> &str {
    match text.char_indices().nth(TEXT_PREFIX_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Fingerprint of a rendered batch: the ordered, pipe-joined text prefixes
/// of every visible record. Two renders with equal fingerprints are treated
/// as the same content.
pub fn batch_fingerprint(records: &[RawReview]) -> String {
    records
        .iter()
        .map(|r| text_prefix(&r.text))
        .collect::<Vec<_>>()
        .join("|")
}

/// Dedup key for one record. Author and date qualify the text prefix, so
/// two reviewers opening with the same line stay distinct.
pub fn stable_key(record: &RawReview) -> String {
    format!(
        "{}|{}|{}",
        record.author_name,
        record.date_text,
        text_prefix(&record.text)
    )
}
