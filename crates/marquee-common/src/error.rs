//! Error types for movie searches.
//!
//! A search either completes, is rejected by the metadata service with an
//! application-level message, or fails somewhere in transport. Callers only
//! ever show the rejection message verbatim; transport detail is for logs.

/// Message shown when the service rejects a request without saying why.
pub const DEFAULT_REJECTION_MESSAGE: &str = "Failed to fetch movies";

/// Message shown for every transport, status, or decoding failure.
pub const GENERIC_FETCH_MESSAGE: &str = "Error fetching movies. Please try later.";

/// Error returned by a metadata search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The service answered but flagged the request as failed.
    #[error("{0}")]
    Rejected(String),

    /// Network, HTTP status, or body decoding failure.
    #[error("movie fetch failed: {0}")]
    Fetch(String),
}

impl SearchError {
    /// Create a new Rejected error.
    pub fn rejected<S: Into<String>>(msg: S) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create a new Fetch error.
    pub fn fetch<S: Into<String>>(detail: S) -> Self {
        Self::Fetch(detail.into())
    }

    /// Text safe to put in front of a user.
    ///
    /// Rejections carry the service message; every other failure collapses
    /// to [`GENERIC_FETCH_MESSAGE`].
    pub fn user_message(&self) -> &str {
        match self {
            Self::Rejected(msg) if !msg.trim().is_empty() => msg,
            Self::Rejected(_) => DEFAULT_REJECTION_MESSAGE,
            Self::Fetch(_) => GENERIC_FETCH_MESSAGE,
        }
    }

    /// Whether this is a logical failure reported by the service.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Result type alias for metadata searches.
pub type SearchResult<T> = std::result::Result<T, SearchError>;
