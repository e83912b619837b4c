//! Debounced search flow.
//!
//! - [`debounce`] -- Quiescence timer between keystrokes and fetches.
//! - [`orchestrator`] -- State machine sequencing the metadata and tracker
//!   clients.

pub mod debounce;
pub mod orchestrator;

pub use debounce::Debouncer;
pub use orchestrator::SearchOrchestrator;
