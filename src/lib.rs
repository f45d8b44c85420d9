//! downwind - dependency-impact regression testing
//!
//! When an upstream package publishes a new version, downwind runs the test
//! suite of every registered downstream consumer against it inside a
//! disposable isolated environment, and records each outcome in a durable,
//! queryable ledger.
//!
//! The crate is a library only: command-line, HTTP, and dashboard front ends
//! are external consumers of [`core::services`].

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapters;
pub mod config;
pub mod core;
pub mod paths;
