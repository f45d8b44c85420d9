//! Core services
//!
//! - [`DependencyGraph`] - persisted registry of upstream→downstream edges
//! - [`ResultsLedger`] - append-only, queryable log of test outcomes
//! - [`VersionWatcher`] - poll-diff loop over an external version source
//! - [`TestOrchestrator`] - bounded worker pool running isolated test jobs
//! - [`Coordinator`] - ties watcher output to orchestrator input

mod coordinator;
mod graph;
mod ledger;
mod orchestrator;
mod watcher;

pub use coordinator::Coordinator;
pub use graph::DependencyGraph;
pub use ledger::{LedgerSummary, ResultFilter, ResultsLedger};
pub use orchestrator::TestOrchestrator;
pub use watcher::{PollOutcome, VersionWatcher};
