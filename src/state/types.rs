use chrono::{DateTime, Utc};
use marquee_common::{MovieRecord, TrendingEntry};
use serde::{Deserialize, Serialize};

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    /// Raw query as last typed
    pub query: String,
    /// Query the current results belong to
    pub debounced_query: String,
    pub movies: Vec<MovieRecord>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub trending: Vec<TrendingEntry>,
    pub trending_loading: bool,
    /// Identifier of the most recently issued trending load
    pub trending_request_id: u64,
    /// Identifier of the most recently issued fetch; only its outcome may
    /// change `movies`, `is_loading`, or `error_message`
    pub request_id: u64,
    /// Number of fetches whose outcome has been applied
    pub completed_requests: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    TrendingLoading,
    Searching,
    ResultsReady,
    ErrorShown,
}

impl SearchState {
    pub fn phase(&self) -> SearchPhase {
        if self.is_loading {
            SearchPhase::Searching
        } else if self.error_message.is_some() {
            SearchPhase::ErrorShown
        } else if self.completed_requests > 0 {
            SearchPhase::ResultsReady
        } else if self.trending_loading {
            SearchPhase::TrendingLoading
        } else {
            SearchPhase::Idle
        }
    }

    /// Issue a new fetch for `query`, returning its request id.
    pub fn begin_request(&mut self, query: &str) -> u64 {
        self.request_id += 1;
        self.debounced_query = query.to_string();
        self.is_loading = true;
        self.error_message = None;
        self.request_id
    }

    pub fn is_current(&self, request_id: u64) -> bool {
        self.request_id == request_id
    }

    /// Issue a new trending load, returning its id.
    pub fn begin_trending(&mut self) -> u64 {
        self.trending_request_id += 1;
        self.trending_loading = true;
        self.trending_request_id
    }

    pub fn is_current_trending(&self, trending_id: u64) -> bool {
        self.trending_request_id == trending_id
    }

    pub fn apply_results(&mut self, movies: Vec<MovieRecord>) {
        self.movies = movies;
        self.finish_request();
    }

    pub fn apply_error(&mut self, message: impl Into<String>) {
        self.movies.clear();
        self.error_message = Some(message.into());
        self.finish_request();
    }

    fn finish_request(&mut self) {
        self.is_loading = false;
        self.completed_requests += 1;
        self.updated_at = Some(Utc::now());
    }
}

/// State snapshot together with its derived phase, as sent to clients.
#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    pub phase: SearchPhase,
    #[serde(flatten)]
    pub state: SearchState,
}

impl From<SearchState> for StateView {
    fn from(state: SearchState) -> Self {
        Self {
            phase: state.phase(),
            state,
        }
    }
}
