//! Concrete metadata client implementations.
//!
//! Each submodule wraps a single external API and implements the
//! [`MetadataClient`](super::MetadataClient) trait.

pub mod tmdb;

pub use tmdb::TmdbClient;
