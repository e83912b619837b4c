//! The search state machine.
//!
//! Raw keystrokes go through a [`Debouncer`]; every published query triggers
//! one metadata fetch. Fetches run concurrently and are never aborted, so
//! each one is tagged with a request id and only the latest issued request
//! may touch visible state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use marquee_common::{is_explicit_query, MovieRecord, SearchError};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SearchConfig;
use crate::metadata::MetadataClient;
use crate::search::debounce::Debouncer;
use crate::state::{SearchEvent, SearchState, StateStore};
use crate::tracker::PopularityTracker;

pub struct SearchOrchestrator {
    metadata: Arc<dyn MetadataClient>,
    tracker: Arc<dyn PopularityTracker>,
    store: Arc<StateStore>,
    debouncer: Debouncer<String>,
    trending_limit: usize,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    mounted: AtomicBool,
}

impl SearchOrchestrator {
    pub fn new(
        settings: &SearchConfig,
        metadata: Arc<dyn MetadataClient>,
        tracker: Arc<dyn PopularityTracker>,
    ) -> Arc<Self> {
        Arc::new(Self {
            metadata,
            tracker,
            store: Arc::new(StateStore::new()),
            debouncer: Debouncer::new(
                String::new(),
                Duration::from_millis(settings.debounce_ms),
            ),
            trending_limit: settings.trending_limit,
            tasks: Mutex::new(Vec::new()),
            mounted: AtomicBool::new(false),
        })
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn snapshot(&self) -> SearchState {
        self.store.snapshot()
    }

    /// Start the orchestrator.
    ///
    /// Loads the trending panel once and starts following the debounced
    /// query, beginning with a fetch for its initial (empty) value.
    /// Mounting an already mounted orchestrator does nothing.
    pub fn mount(self: &Arc<Self>) {
        if self.mounted.swap(true, Ordering::SeqCst) {
            debug!("Search orchestrator already mounted");
            return;
        }

        info!(
            metadata = self.metadata.name(),
            tracker = self.tracker.name(),
            debounce_ms = self.debouncer.interval().as_millis() as u64,
            "Mounting search orchestrator"
        );
        if !self.metadata.is_configured() {
            warn!("Metadata client has no credential; searches will be rejected");
        }

        let this = Arc::clone(self);
        let trending = tokio::spawn(async move { this.load_trending().await });

        let driver = tokio::spawn(Self::follow_debounced(
            Arc::downgrade(self),
            self.debouncer.subscribe(),
        ));

        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(trending);
        tasks.push(driver);
    }

    async fn follow_debounced(this: Weak<Self>, mut rx: tokio::sync::watch::Receiver<String>) {
        let initial = rx.borrow_and_update().clone();
        let mut query = initial;
        loop {
            let Some(orchestrator) = this.upgrade() else {
                break;
            };
            tokio::spawn(async move { orchestrator.fetch_movies(&query).await });

            if rx.changed().await.is_err() {
                break;
            }
            query = rx.borrow_and_update().clone();
            debug!(query = %query, "Debounced query changed");
        }
        debug!("Debounce driver stopped");
    }

    /// Record a keystroke. The search follows once typing pauses.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.store.update(|s| s.query = query.clone());
        self.debouncer.push(query);
    }

    /// Run one fetch cycle for `query` and apply its outcome if it is still
    /// the latest request.
    pub async fn fetch_movies(&self, query: &str) {
        let mut request_id = 0;
        self.store.update(|s| request_id = s.begin_request(query));
        self.store.emit(SearchEvent::SearchStarted {
            request_id,
            query: query.to_string(),
        });
        debug!(request_id, query = %query, "Fetching movies");

        let outcome = self.metadata.search(query).await;

        match outcome {
            Ok(movies) => {
                let count = movies.len();
                let top = if is_explicit_query(query) {
                    movies.first().cloned()
                } else {
                    None
                };
                if !self.apply(request_id, |s| s.apply_results(movies)) {
                    return;
                }
                debug!(request_id, results = count, "Movies fetched");
                self.store.emit(SearchEvent::SearchCompleted {
                    request_id,
                    query: query.to_string(),
                    results: count,
                });

                if let Some(top) = top {
                    self.record_search(query, &top).await;
                }
            }
            Err(err) => {
                let shown = err.user_message().to_string();
                if !self.apply(request_id, |s| s.apply_error(shown)) {
                    return;
                }
                let query = query.to_string();
                match err {
                    SearchError::Rejected(message) => {
                        warn!(request_id, query = %query, %message, "Metadata service rejected search");
                        self.store.emit(SearchEvent::SearchRejected {
                            request_id,
                            query,
                            message,
                        });
                    }
                    SearchError::Fetch(_) => {
                        error!(request_id, query = %query, "Error fetching movies: {}", err);
                        self.store.emit(SearchEvent::SearchFailed {
                            request_id,
                            query,
                            error: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Apply `update` only if `request_id` is still the latest request.
    fn apply<F>(&self, request_id: u64, update: F) -> bool
    where
        F: FnOnce(&mut SearchState),
    {
        let mut latest = request_id;
        let applied = self.store.update_if(|s| {
            if s.is_current(request_id) {
                update(s);
                true
            } else {
                latest = s.request_id;
                false
            }
        });

        if !applied {
            debug!(request_id, latest, "Discarding stale search response");
            self.store
                .emit(SearchEvent::StaleResponseDiscarded { request_id, latest });
        }
        applied
    }

    async fn record_search(&self, query: &str, top: &MovieRecord) {
        match self.tracker.record_search(query, top).await {
            Ok(()) => {
                debug!(query = %query, movie_id = top.id, "Search recorded");
                self.store.emit(SearchEvent::SearchRecorded {
                    query: query.to_string(),
                });
            }
            Err(e) => {
                warn!(query = %query, "Failed to record search: {:#}", e);
                self.store.emit(SearchEvent::RecordFailed {
                    query: query.to_string(),
                    error: format!("{e:#}"),
                });
            }
        }
    }

    /// Fetch the trending panel. Failures leave the current panel untouched.
    ///
    /// Loads may overlap; only the most recently issued one is applied.
    pub async fn load_trending(&self) {
        let mut trending_id = 0;
        self.store.update(|s| trending_id = s.begin_trending());

        let outcome = self.tracker.trending(self.trending_limit).await;

        let mut latest = trending_id;
        let mut loaded = 0;
        let applied = self.store.update_if(|s| {
            if !s.is_current_trending(trending_id) {
                latest = s.trending_request_id;
                return false;
            }
            if let Ok(ref entries) = outcome {
                loaded = entries.len();
                s.trending = entries.clone();
            }
            s.trending_loading = false;
            true
        });

        if !applied {
            debug!(trending_id, latest, "Discarding stale trending response");
            return;
        }

        match outcome {
            Ok(_) => {
                debug!(entries = loaded, "Trending searches loaded");
                self.store.emit(SearchEvent::TrendingLoaded { entries: loaded });
            }
            Err(e) => {
                warn!("Error fetching trending movies: {:#}", e);
                self.store.emit(SearchEvent::TrendingFailed {
                    error: format!("{e:#}"),
                });
            }
        }
    }

    /// Re-run the trending fetch in the background.
    pub fn refresh_trending(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.load_trending().await });

        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    /// Cancel the pending debounce and stop background tasks.
    pub fn shutdown(&self) {
        self.debouncer.cancel();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.mounted.store(false, Ordering::SeqCst);
        debug!("Search orchestrator shut down");
    }
}

impl Drop for SearchOrchestrator {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
