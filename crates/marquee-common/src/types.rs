//! Core type definitions for search results and popularity counters.
//!
//! Both types serialize with snake_case field names so the presentation
//! layer can hand them to a browser front end unchanged.

use serde::{Deserialize, Serialize};

/// A single movie returned by a metadata search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// Provider identifier (TMDB numeric ID).
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Poster path fragment such as `"/abc123.jpg"`, if the movie has one.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Provider popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Community rating (0.0 - 10.0).
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Release date as an ISO-8601 string (YYYY-MM-DD).
    #[serde(default)]
    pub release_date: Option<String>,
    /// ISO-639-1 code of the original language.
    #[serde(default)]
    pub original_language: Option<String>,
}

impl MovieRecord {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: None,
            popularity: 0.0,
            vote_average: None,
            release_date: None,
            original_language: None,
        }
    }

    pub fn with_poster(mut self, poster_path: impl Into<String>) -> Self {
        self.poster_path = Some(poster_path.into());
        self
    }

    /// Full poster URL under `base`, or `None` when there is no poster.
    pub fn poster_url(&self, base: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", base.trim_end_matches('/'), p))
    }

    /// Four-digit release year, if the release date carries one.
    pub fn release_year(&self) -> Option<u16> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<u16>().ok())
    }
}

/// A popularity counter for one normalized query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingEntry {
    /// Backend document identifier.
    pub id: String,
    /// Normalized query text this counter is keyed by.
    pub query_text: String,
    /// Number of recorded searches.
    pub count: u64,
    /// Top result of the first recorded search.
    pub movie_id: u64,
    /// Poster URL of that top result.
    pub poster_url: Option<String>,
}

/// Canonical form of a query used to key popularity counters.
///
/// Trims, collapses whitespace runs, and lowercases.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A query is explicit when it contains anything besides whitespace.
pub fn is_explicit_query(query: &str) -> bool {
    !query.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("Batman"), "batman");
        assert_eq!(normalize_query("  the   dark\tknight "), "the dark knight");
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn test_explicit_query() {
        assert!(is_explicit_query("dune"));
        assert!(!is_explicit_query(""));
        assert!(!is_explicit_query(" \t"));
    }

    #[test]
    fn test_poster_url() {
        let movie = MovieRecord::new(1, "Alien").with_poster("/alien.jpg");
        assert_eq!(
            movie.poster_url("https://image.tmdb.org/t/p/w500/").as_deref(),
            Some("https://image.tmdb.org/t/p/w500/alien.jpg")
        );
        assert_eq!(MovieRecord::new(2, "No Poster").poster_url("https://x"), None);
    }

    #[test]
    fn test_release_year() {
        let mut movie = MovieRecord::new(1, "Dune");
        assert_eq!(movie.release_year(), None);
        movie.release_date = Some("2021-09-15".to_string());
        assert_eq!(movie.release_year(), Some(2021));
    }

    #[test]
    fn test_movie_record_tolerates_sparse_json() {
        let movie: MovieRecord =
            serde_json::from_str(r#"{"id": 27205, "title": "Inception"}"#).unwrap();
        assert_eq!(movie.id, 27205);
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.popularity, 0.0);
    }
}
