//! Marquee-Common: Shared types and errors.
//!
//! This crate provides the types that cross the boundary between the
//! metadata client, the popularity tracker, and the presentation layer:
//!
//! - **Movie records**: the immutable rows returned by a metadata search
//! - **Trending entries**: per-query popularity counters read back from the tracker
//! - **Query normalization**: the canonical form used to key popularity counters
//! - **Error Handling**: the search error taxonomy surfaced to the orchestrator
//!
//! # Examples
//!
//! ```
//! use marquee_common::{normalize_query, MovieRecord, SearchError};
//!
//! assert_eq!(normalize_query("  The   Batman "), "the batman");
//!
//! let movie = MovieRecord::new(414906, "The Batman").with_poster("/74xTEgt7R36Fpooo50r9T25onhq.jpg");
//! assert_eq!(
//!     movie.poster_url("https://image.tmdb.org/t/p/w500").as_deref(),
//!     Some("https://image.tmdb.org/t/p/w500/74xTEgt7R36Fpooo50r9T25onhq.jpg"),
//! );
//!
//! let err = SearchError::rejected("Invalid API key");
//! assert_eq!(err.user_message(), "Invalid API key");
//! ```

pub mod error;
pub mod types;

pub use error::{SearchError, SearchResult, DEFAULT_REJECTION_MESSAGE, GENERIC_FETCH_MESSAGE};
pub use types::*;
