//! Shared test harness for integration tests.
//!
//! Provides in-process fakes for the two outbound collaborators and a
//! [`TestHarness`] wiring them into a [`SearchOrchestrator`] and router.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use marquee::config::Config;
use marquee::metadata::MetadataClient;
use marquee::search::SearchOrchestrator;
use marquee::server::{create_router, AppContext};
use marquee::state::{SearchEvent, SearchState};
use marquee::tracker::{MemoryTracker, PopularityTracker};
use marquee_common::{MovieRecord, SearchError, SearchResult, TrendingEntry};
use parking_lot::Mutex;
use tokio::sync::broadcast;

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

pub fn movie(id: u64, title: &str) -> MovieRecord {
    MovieRecord::new(id, title).with_poster(format!("/{id}.jpg"))
}

/// What the fake metadata service answers for one query.
#[derive(Clone)]
pub enum Reply {
    Movies(Vec<MovieRecord>),
    Rejected(String),
    Fails(String),
}

/// Scripted [`MetadataClient`].
///
/// Unscripted queries answer with an empty list. Every call is logged.
#[derive(Default)]
pub struct FakeMetadata {
    replies: Mutex<HashMap<String, (Reply, Duration)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeMetadata {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, query: &str, reply: Reply) {
        self.reply_after(query, reply, Duration::ZERO);
    }

    pub fn reply_after(&self, query: &str, reply: Reply, delay: Duration) {
        self.replies.lock().insert(query.to_string(), (reply, delay));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MetadataClient for FakeMetadata {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> SearchResult<Vec<MovieRecord>> {
        self.calls.lock().push(query.to_string());
        let scripted = self.replies.lock().get(query).cloned();
        let (reply, delay) = scripted.unwrap_or((Reply::Movies(Vec::new()), Duration::ZERO));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Movies(movies) => Ok(movies),
            Reply::Rejected(message) => Err(SearchError::rejected(message)),
            Reply::Fails(detail) => Err(SearchError::fetch(detail)),
        }
    }
}

/// [`PopularityTracker`] that logs calls and delegates to a [`MemoryTracker`],
/// or fails every call when `failing` is set.
pub struct RecordingTracker {
    inner: MemoryTracker,
    failing: bool,
    recorded: Mutex<Vec<(String, u64)>>,
    trending_delays: Mutex<VecDeque<Duration>>,
}

impl RecordingTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryTracker::new(POSTER_BASE),
            failing: false,
            recorded: Mutex::new(Vec::new()),
            trending_delays: Mutex::new(VecDeque::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryTracker::new(POSTER_BASE),
            failing: true,
            recorded: Mutex::new(Vec::new()),
            trending_delays: Mutex::new(VecDeque::new()),
        })
    }

    /// `(query, top result id)` for every `record_search` call.
    pub fn recorded(&self) -> Vec<(String, u64)> {
        self.recorded.lock().clone()
    }

    /// Delay successive `trending` replies. The counters are read before
    /// the delay, so a delayed reply carries the counters at call time.
    pub fn delay_trending(&self, delays: &[Duration]) {
        self.trending_delays.lock().extend(delays.iter().copied());
    }

    pub fn inner(&self) -> &MemoryTracker {
        &self.inner
    }
}

#[async_trait]
impl PopularityTracker for RecordingTracker {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn record_search(&self, query: &str, top_result: &MovieRecord) -> anyhow::Result<()> {
        self.recorded
            .lock()
            .push((query.to_string(), top_result.id));
        if self.failing {
            anyhow::bail!("tracker quota exceeded");
        }
        self.inner.record_search(query, top_result).await
    }

    async fn trending(&self, limit: usize) -> anyhow::Result<Vec<TrendingEntry>> {
        if self.failing {
            anyhow::bail!("tracker unauthorized");
        }
        let entries = self.inner.trending(limit).await?;
        let delay = self.trending_delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(entries)
    }
}

/// Orchestrator wired to fakes with a short debounce interval.
pub struct TestHarness {
    pub metadata: Arc<FakeMetadata>,
    pub tracker: Arc<RecordingTracker>,
    pub orchestrator: Arc<SearchOrchestrator>,
    pub config: Config,
}

impl TestHarness {
    pub const DEBOUNCE: Duration = Duration::from_millis(50);

    pub fn new() -> Self {
        Self::with_tracker(RecordingTracker::new())
    }

    pub fn with_tracker(tracker: Arc<RecordingTracker>) -> Self {
        let mut config = Config::default();
        config.search.debounce_ms = Self::DEBOUNCE.as_millis() as u64;

        let metadata = FakeMetadata::new();
        let orchestrator = SearchOrchestrator::new(
            &config.search,
            Arc::clone(&metadata) as Arc<dyn MetadataClient>,
            Arc::clone(&tracker) as Arc<dyn PopularityTracker>,
        );

        Self {
            metadata,
            tracker,
            orchestrator,
            config,
        }
    }

    pub fn state(&self) -> SearchState {
        self.orchestrator.snapshot()
    }

    pub fn events(&self) -> broadcast::Receiver<SearchEvent> {
        self.orchestrator.store().subscribe()
    }

    pub fn context(&self) -> AppContext {
        AppContext {
            orchestrator: Arc::clone(&self.orchestrator),
            config: Arc::new(self.config.clone()),
        }
    }

    /// Wait until `done` holds for the current state, or panic after `timeout`.
    pub async fn wait_for<F>(&self, timeout: Duration, mut done: F) -> SearchState
    where
        F: FnMut(&SearchState) -> bool,
    {
        let mut rx = self.orchestrator.store().watch();
        let result = tokio::time::timeout(timeout, async {
            loop {
                {
                    let state = rx.borrow_and_update();
                    if done(&state) {
                        return state.clone();
                    }
                }
                if rx.changed().await.is_err() {
                    panic!("state store closed");
                }
            }
        })
        .await;
        result.unwrap_or_else(|_| panic!("timed out; last state: {:?}", self.state()))
    }

    /// Start an Axum server on a random port and return the bound address.
    pub async fn serve(&self) -> SocketAddr {
        let app = create_router(self.context(), None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }
}

/// Drain every event currently buffered in `rx`.
pub fn drain(rx: &mut broadcast::Receiver<SearchEvent>) -> Vec<SearchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
