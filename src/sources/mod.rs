//! Source adapters: one module per upstream, each implementing the
//! [`ContentSource`] capability contract.

pub mod ao3;
pub mod fanmtl;
pub mod mangadex;

use crate::error::SourceResult;
use crate::models::{Chapter, ContentItem, SourceInfo};
use async_trait::async_trait;

/// Sentinel body returned when every content-extraction selector misses.
/// Keeps the reader functional instead of erroring on a layout change.
pub const CONTENT_NOT_FOUND: &str =
    "<p>Content not found. Please try opening the original link.</p>";

/// Search parameters. Each adapter maps `page`/`limit` onto its own
/// upstream semantics; relevance ordering is whatever the upstream returns.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub page: u32,
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            limit: 20,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }
}

/// Capability contract every upstream source implements.
///
/// Adapters always receive and return unprefixed, source-local ids;
/// namespacing is an aggregation-layer concern. `search` must not fail on
/// zero matches (empty vec is a valid result) — errors are reserved for
/// upstream unreachability. `list_chapters` returns canonical reading order
/// (ascending chapter number) regardless of how the upstream lists them.
#[async_trait]
pub trait ContentSource: Send + Sync {
    fn info(&self) -> &SourceInfo;

    async fn search(&self, query: &SearchQuery) -> SourceResult<Vec<ContentItem>>;

    async fn get_details(&self, id: &str) -> SourceResult<ContentItem>;

    async fn list_chapters(&self, id: &str) -> SourceResult<Vec<Chapter>>;

    async fn get_chapter_content(&self, novel_id: &str, chapter_id: &str)
        -> SourceResult<Chapter>;
}
