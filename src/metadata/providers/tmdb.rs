//! TMDB (The Movie Database) metadata client.
//!
//! Implements [`MetadataClient`] against the TMDB v3 REST API.
//!
//! Features:
//! - Keyword search via `/search/movie`, popular listing via `/discover/movie`.
//! - Bearer-token authentication and JSON accept header on every request.
//! - Token-bucket rate limiting via [`governor`].
//! - Request timeout so a hung call cannot leave a search loading forever.
//!
//! There is no retry: a failed search is retried by the next keystroke.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use marquee_common::{is_explicit_query, MovieRecord, SearchError, SearchResult};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::config::TmdbConfig;
use crate::metadata::provider::MetadataClient;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const SEARCH_PATH: &str = "/search/movie";
const DISCOVER_PATH: &str = "/discover/movie";
const DISCOVER_SORT: &str = "popularity.desc";

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct TmdbListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    results: Vec<TmdbMovie>,
    /// TMDB's error contract: `{"success": false, "status_message": "..."}`
    success: Option<bool>,
    status_message: Option<String>,
    /// Legacy `{"Response": "False", "Error": "..."}` failure flag
    #[serde(rename = "Response")]
    response_flag: Option<serde_json::Value>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl TmdbListResponse {
    /// The failure message when the body flags the request as failed.
    ///
    /// `Some("")` means failed without a message.
    fn failure(&self) -> Option<String> {
        if self.success == Some(false) {
            return Some(
                self.status_message
                    .clone()
                    .or_else(|| self.error.clone())
                    .unwrap_or_default(),
            );
        }

        let flagged = match &self.response_flag {
            Some(serde_json::Value::Bool(b)) => !b,
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("false"),
            _ => false,
        };
        if flagged {
            return Some(
                self.error
                    .clone()
                    .or_else(|| self.status_message.clone())
                    .unwrap_or_default(),
            );
        }

        None
    }
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: u64,
    title: Option<String>,
    poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    popularity: f64,
    vote_average: Option<f64>,
    release_date: Option<String>,
    original_language: Option<String>,
}

impl From<TmdbMovie> for MovieRecord {
    fn from(m: TmdbMovie) -> Self {
        MovieRecord {
            id: m.id,
            title: m.title.unwrap_or_default(),
            poster_path: m.poster_path,
            popularity: m.popularity,
            vote_average: m.vote_average,
            release_date: m.release_date.filter(|d| !d.is_empty()),
            original_language: m.original_language,
        }
    }
}

// ---------------------------------------------------------------------------
// Client implementation
// ---------------------------------------------------------------------------

/// TMDB metadata client.
///
/// # Examples
///
/// ```no_run
/// use marquee::config::TmdbConfig;
/// use marquee::metadata::TmdbClient;
///
/// let config = TmdbConfig {
///     api_key: "your-read-access-token".into(),
///     ..TmdbConfig::default()
/// };
/// let client = TmdbClient::new(&config);
/// ```
pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            rate_limiter,
        }
    }

    /// Path and query parameters for `query`.
    ///
    /// Blank queries list popular movies instead of searching.
    fn endpoint(query: &str) -> (&'static str, Vec<(&'static str, &str)>) {
        if is_explicit_query(query) {
            (SEARCH_PATH, vec![("query", query)])
        } else {
            (DISCOVER_PATH, vec![("sort_by", DISCOVER_SORT)])
        }
    }

    async fn fetch(&self, query: &str) -> SearchResult<TmdbListResponse> {
        let (path, params) = Self::endpoint(query);
        let url = format!("{}{}", self.base_url, path);

        self.rate_limiter.until_ready().await;
        debug!(url = %url, ?params, "TMDB movie request");

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SearchError::fetch(format!("TMDB request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::fetch(format!("TMDB {status}: {body}")));
        }

        resp.json::<TmdbListResponse>()
            .await
            .map_err(|e| SearchError::fetch(format!("TMDB parse error: {e}")))
    }
}

#[async_trait]
impl MetadataClient for TmdbClient {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn search(&self, query: &str) -> SearchResult<Vec<MovieRecord>> {
        let body = self.fetch(query).await?;

        if let Some(message) = body.failure() {
            debug!(%message, "TMDB flagged request as failed");
            return Err(SearchError::rejected(message));
        }

        Ok(body.results.into_iter().map(MovieRecord::from).collect())
    }
}
