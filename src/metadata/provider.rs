//! Trait definition for movie metadata clients.
//!
//! The orchestrator talks to the metadata service only through
//! [`MetadataClient`], so tests can substitute an in-process fake.

use async_trait::async_trait;
use marquee_common::{MovieRecord, SearchResult};

/// Async trait that all movie metadata backends must implement.
///
/// Implementations are shared across tasks behind an `Arc`.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Short, lowercase identifier for this backend (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the client has a credential to send.
    fn is_configured(&self) -> bool;

    /// Search for movies matching `query`.
    ///
    /// A blank query lists currently popular movies instead. The returned
    /// order is the service's order.
    async fn search(&self, query: &str) -> SearchResult<Vec<MovieRecord>>;
}
