//! Marquee - Debounced movie search with a trending panel
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod metadata;
pub mod search;
pub mod server;
pub mod state;
pub mod tracker;
