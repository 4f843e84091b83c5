//! Content-aware file organization with a durable audit trail.
//!
//! Files are scanned, their text extracted, classified into a category,
//! relocated under `destination/<category>/` without ever overwriting
//! anything, and every outcome is appended to a ledger that supports undo.

pub mod classify;
pub mod config;
pub mod error;
pub mod execution;
pub mod extract;
pub mod ledger;
pub mod pipeline;
pub mod planner;
pub mod resolver;
pub mod scanner;

pub use classify::{Classifier, HttpClassifier, KeywordClassifier};
pub use config::OrganizerConfig;
pub use error::{OrganizerError, Result};
pub use pipeline::{Pipeline, RunSummary};

use tracing_subscriber::EnvFilter;

/// Initialize tracing with RUST_LOG env filtering.
/// Default: warn for dependencies, info for this crate (run summaries
/// visible). Use RUST_LOG=debug for per-file logs.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,sortd=info")),
        )
        .init();
}
