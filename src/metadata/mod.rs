//! Movie metadata lookups.
//!
//! # Module layout
//!
//! - [`provider`] -- The [`MetadataClient`] trait.
//! - [`providers`] -- Concrete clients (TMDB).

pub mod provider;
pub mod providers;

pub use provider::MetadataClient;
pub use providers::TmdbClient;
