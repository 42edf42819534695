//! Scripted review sources for collector tests.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::source::{RawReview, ReviewSource};

/// Replays a fixed sequence of rendered pages. `trigger_more()` advances
/// the cursor, so content changes as soon as the collector polls again.
pub struct ScriptedSource {
    pages: Vec<Vec<RawReview>>,
    cursor: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Vec<RawReview>>) -> Self {
        Self {
            pages,
            cursor: Mutex::new(0),
        }
    }
}

#[async_trait]
impl ReviewSource for ScriptedSource {
    async fn visible_records(&self) -> Result<Vec<RawReview>> {
        let cursor = *self.cursor.lock().expect("cursor lock");
        Ok(self.pages.get(cursor).cloned().unwrap_or_default())
    }

    async fn has_more(&self) -> Result<bool> {
        let cursor = *self.cursor.lock().expect("cursor lock");
        Ok(cursor + 1 < self.pages.len())
    }

    async fn trigger_more(&self) -> Result<bool> {
        let mut cursor = self.cursor.lock().expect("cursor lock");
        if *cursor + 1 < self.pages.len() {
            *cursor += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Renders the same page no matter how often "load more" fires. Reproduces
/// a source that silently ran out of content.
pub struct FrozenSource {
    page: Vec<RawReview>,
}

impl FrozenSource {
    pub fn new(page: Vec<RawReview>) -> Self {
        Self { page }
    }
}

#[async_trait]
impl ReviewSource for FrozenSource {
    async fn visible_records(&self) -> Result<Vec<RawReview>> {
        Ok(self.page.clone())
    }

    async fn has_more(&self) -> Result<bool> {
        Ok(true)
    }

    async fn trigger_more(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Shorthand for building test records.
pub fn review(author: &str, date: &str, text: &str) -> RawReview {
    RawReview {
        author_name: author.to_string(),
        date_text: date.to_string(),
        text: text.to_string(),
        rating: None,
    }
}
