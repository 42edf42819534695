//! The paginated dedup collection loop.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::fingerprint::{batch_fingerprint, stable_key};
use crate::source::{RawReview, ReviewSource};

/// Two consecutive extractions with nothing new means the source is cycling
/// already-seen content.
const CONSECUTIVE_EMPTY_LIMIT: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct CollectorConfig {
    /// Stop once this many unique records are held.
    pub max_items: usize,
    /// Hard bound on extract/trigger rounds.
    pub max_iterations: u32,
    /// Fingerprint poll interval while waiting for a page to change.
    pub poll_interval: Duration,
    /// How long a triggered page gets to change before the run is cut off.
    pub change_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_items: 500,
            max_iterations: 30,
            poll_interval: Duration::from_millis(500),
            change_timeout: Duration::from_secs(10),
        }
    }
}

/// Why a collection run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    ItemBudget,
    IterationBudget,
    NoNewContent,
    NoMorePages,
    ChangeTimeout,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::ItemBudget => write!(f, "item_budget"),
            StopReason::IterationBudget => write!(f, "iteration_budget"),
            StopReason::NoNewContent => write!(f, "no_new_content"),
            StopReason::NoMorePages => write!(f, "no_more_pages"),
            StopReason::ChangeTimeout => write!(f, "change_timeout"),
        }
    }
}

/// A finished run: every unique record in first-seen order, the number of
/// extraction rounds, and why the run stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionOutcome {
    pub reviews: Vec<RawReview>,
    pub iterations: u32,
    pub stop_reason: StopReason,
}

/// Drives "load next batch" interactions against a [`ReviewSource`],
/// deduplicating by stable key and using batch fingerprints to tell a
/// freshly rendered page from a re-render of the old one.
///
/// Termination is guaranteed by the iteration budget plus the bounded
/// fingerprint wait; a wait that times out is a soft failure returning
/// everything collected so far.
pub struct PaginatedDedupCollector<S> {
    source: S,
    config: CollectorConfig,
}

impl<S: ReviewSource> PaginatedDedupCollector<S> {
    pub fn new(source: S, config: CollectorConfig) -> Self {
        Self { source, config }
    }

    pub async fn collect(&self) -> Result<CollectionOutcome> {
        let mut seen = HashSet::new();
        let mut reviews: Vec<RawReview> = Vec::new();
        let mut consecutive_empty = 0u32;
        let mut iterations = 0u32;

        let stop_reason = loop {
            iterations += 1;
            let visible = self.source.visible_records().await?;
            let fingerprint = batch_fingerprint(&visible);

            let mut added = 0usize;
            for record in visible {
                if reviews.len() >= self.config.max_items {
                    break;
                }
                if seen.insert(stable_key(&record)) {
                    reviews.push(record);
                    added += 1;
                }
            }
            debug!(
                iteration = iterations,
                added,
                total = reviews.len(),
                "Extracted visible records"
            );

            if reviews.len() >= self.config.max_items {
                break StopReason::ItemBudget;
            }
            if iterations >= self.config.max_iterations {
                break StopReason::IterationBudget;
            }
            if added == 0 {
                consecutive_empty += 1;
                if consecutive_empty >= CONSECUTIVE_EMPTY_LIMIT {
                    break StopReason::NoNewContent;
                }
            } else {
                consecutive_empty = 0;
            }
            if !self.source.has_more().await? || !self.source.trigger_more().await? {
                break StopReason::NoMorePages;
            }
            if !self.wait_for_change(&fingerprint).await? {
                break StopReason::ChangeTimeout;
            }
        };

        info!(
            unique = reviews.len(),
            iterations,
            stop_reason = %stop_reason,
            "Collection finished"
        );
        Ok(CollectionOutcome {
            reviews,
            iterations,
            stop_reason,
        })
    }

    /// Poll the source until its fingerprint differs from `before`. `false`
    /// means the bounded wait elapsed with no change, which the caller
    /// treats as a silent end of content.
    async fn wait_for_change(&self, before: &str) -> Result<bool> {
        let changed = async {
            loop {
                sleep(self.config.poll_interval).await;
                let visible = self.source.visible_records().await?;
                if batch_fingerprint(&visible) != before {
                    return Ok::<_, anyhow::Error>(());
                }
            }
        };
        match timeout(self.config.change_timeout, changed).await {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(
                    timeout_ms = self.config.change_timeout.as_millis() as u64,
                    "Content did not change after trigger, assuming end of content"
                );
                Ok(false)
            }
        }
    }
}
