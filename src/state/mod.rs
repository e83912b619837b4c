mod types;

pub use types::*;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 256;

/// Diagnostic event emitted by the search orchestrator.
///
/// These mirror the `tracing` output so subscribers (SSE clients, tests) can
/// observe what happened without scraping logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SearchEvent {
    /// A metadata fetch was issued.
    SearchStarted { request_id: u64, query: String },
    /// A fetch completed and its results are now visible.
    SearchCompleted {
        request_id: u64,
        query: String,
        results: usize,
    },
    /// The metadata service flagged the request as failed.
    SearchRejected {
        request_id: u64,
        query: String,
        message: String,
    },
    /// Transport, status, or decoding failure.
    SearchFailed {
        request_id: u64,
        query: String,
        error: String,
    },
    /// A response arrived after a newer request was issued and was dropped.
    StaleResponseDiscarded { request_id: u64, latest: u64 },
    /// A search was counted by the popularity tracker.
    SearchRecorded { query: String },
    /// Counting a search failed; visible state is unaffected.
    RecordFailed { query: String, error: String },
    /// The trending panel was refreshed.
    TrendingLoaded { entries: usize },
    /// Loading the trending panel failed; visible state is unaffected.
    TrendingFailed { error: String },
}

impl SearchEvent {
    /// Whether this event reports a failure of any kind.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SearchEvent::SearchRejected { .. }
                | SearchEvent::SearchFailed { .. }
                | SearchEvent::RecordFailed { .. }
                | SearchEvent::TrendingFailed { .. }
        )
    }
}

/// Observable search state plus the diagnostic event bus.
///
/// The orchestrator is the only writer; every other component subscribes.
pub struct StateStore {
    state_tx: watch::Sender<SearchState>,
    event_tx: broadcast::Sender<SearchEvent>,
}

impl StateStore {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(SearchState::default());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { state_tx, event_tx }
    }

    /// Current state.
    pub fn snapshot(&self) -> SearchState {
        self.state_tx.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn watch(&self) -> watch::Receiver<SearchState> {
        self.state_tx.subscribe()
    }

    /// Receiver for diagnostic events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SearchEvent> {
        self.event_tx.subscribe()
    }

    /// Mutate the state and notify watchers.
    pub fn update<F>(&self, modify: F)
    where
        F: FnOnce(&mut SearchState),
    {
        self.state_tx.send_modify(modify);
    }

    /// Mutate the state only when `modify` returns `true`.
    ///
    /// The check and the mutation happen under one lock, so no other update
    /// can interleave between them.
    pub fn update_if<F>(&self, modify: F) -> bool
    where
        F: FnOnce(&mut SearchState) -> bool,
    {
        self.state_tx.send_if_modified(modify)
    }

    /// Broadcast a diagnostic event to all subscribers.
    pub fn emit(&self, event: SearchEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("No subscribers for search event");
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
