//! Core domain layer
//!
//! Contains the domain records, the port traits that bound the core against
//! external systems, and the services implementing graph, ledger, watcher,
//! orchestrator, and coordinator behavior.
//!
//! Nothing in this module performs I/O directly: all effects go through the
//! traits in [`ports`].

pub mod models;
pub mod ports;
pub mod services;
