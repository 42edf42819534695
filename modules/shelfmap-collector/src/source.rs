//! The content-source boundary driven by the collector.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One review as rendered by a platform, before any entity resolution.
/// `rating` is carried along for downstream consumers but takes no part in
/// dedup identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    pub author_name: String,
    pub date_text: String,
    pub text: String,
    pub rating: Option<f64>,
}

/// Handle onto a live, possibly laggy content source. Production
/// implementations wrap the browser/scraping layer; tests use the scripted
/// sources in [`testing`](crate::testing).
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Every record currently rendered, top to bottom.
    async fn visible_records(&self) -> Result<Vec<RawReview>>;

    /// Whether a usable "load more" affordance is present.
    async fn has_more(&self) -> Result<bool>;

    /// Activate the affordance. `false` means it could not be triggered.
    async fn trigger_more(&self) -> Result<bool>;
}
