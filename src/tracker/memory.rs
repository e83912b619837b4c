//! In-process popularity counters.
//!
//! Used when no hosted backend is configured, and as the reference
//! behaviour for the hosted backends in tests.

use super::{rank, PopularityTracker};
use anyhow::Result;
use marquee_common::{normalize_query, MovieRecord, TrendingEntry};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

pub struct MemoryTracker {
    entries: RwLock<HashMap<String, TrendingEntry>>,
    poster_base: String,
}

impl MemoryTracker {
    pub fn new(poster_base: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            poster_base: poster_base.into(),
        }
    }

    /// Number of distinct queries counted so far
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Counter for `query`, if one exists
    pub fn get(&self, query: &str) -> Option<TrendingEntry> {
        self.entries.read().get(&normalize_query(query)).cloned()
    }
}

#[async_trait::async_trait]
impl PopularityTracker for MemoryTracker {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn record_search(&self, query: &str, top_result: &MovieRecord) -> Result<()> {
        let key = normalize_query(query);
        if key.is_empty() {
            anyhow::bail!("Cannot record a blank query");
        }

        let mut entries = self.entries.write();
        let entry = entries.entry(key.clone()).or_insert_with(|| TrendingEntry {
            id: Uuid::new_v4().simple().to_string(),
            query_text: key,
            count: 0,
            movie_id: top_result.id,
            poster_url: top_result.poster_url(&self.poster_base),
        });
        entry.count += 1;

        tracing::debug!(query = %entry.query_text, count = entry.count, "Search recorded");
        Ok(())
    }

    async fn trending(&self, limit: usize) -> Result<Vec<TrendingEntry>> {
        let entries: Vec<TrendingEntry> = self.entries.read().values().cloned().collect();
        Ok(rank(entries, limit))
    }
}
