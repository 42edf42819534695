//! Review collection against paginated, laggy content sources.
//!
//! A [`PaginatedDedupCollector`] drives repeated "load more" interactions
//! through a [`ReviewSource`] handle. Batch fingerprints stand in for the
//! loading signal the source never gives, and stable per-record keys stand
//! in for the pagination offset it never exposes.

pub mod collector;
pub mod fingerprint;
pub mod source;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use collector::{CollectionOutcome, CollectorConfig, PaginatedDedupCollector, StopReason};
pub use source::{RawReview, ReviewSource};
