//! Search popularity tracking.
//!
//! Every explicit search that produced results bumps a counter keyed by the
//! normalized query; the highest counters form the trending panel. Failures
//! here are never fatal to a search and callers only log them.

pub mod appwrite;
pub mod memory;

pub use appwrite::AppwriteTracker;
pub use memory::MemoryTracker;

use crate::config::{Config, TrackerBackend};
use anyhow::Result;
use marquee_common::{MovieRecord, TrendingEntry};
use std::sync::Arc;

/// Common trait for popularity counter backends
#[async_trait::async_trait]
pub trait PopularityTracker: Send + Sync {
    /// Short, lowercase identifier for this backend
    fn name(&self) -> &'static str;

    /// Count one search for `query`, creating the counter from `top_result`
    /// on first sight
    async fn record_search(&self, query: &str, top_result: &MovieRecord) -> Result<()>;

    /// Counters ordered by descending count, at most `limit` of them
    async fn trending(&self, limit: usize) -> Result<Vec<TrendingEntry>>;
}

/// Create the configured tracker backend
pub fn create_tracker(config: &Config) -> Arc<dyn PopularityTracker> {
    let poster_base = config.tmdb.image_base_url.clone();
    match config.tracker.backend {
        TrackerBackend::Memory => Arc::new(MemoryTracker::new(poster_base)),
        TrackerBackend::Appwrite => Arc::new(AppwriteTracker::new(&config.tracker, poster_base)),
    }
}

/// Order entries for the trending panel and keep the first `limit`.
///
/// Ties are broken by query text so the panel is stable between refreshes.
pub(crate) fn rank(mut entries: Vec<TrendingEntry>, limit: usize) -> Vec<TrendingEntry> {
    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.query_text.cmp(&b.query_text))
    });
    entries.truncate(limit);
    entries
}
