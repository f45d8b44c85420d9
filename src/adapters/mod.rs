//! Adapters implementing the core port traits
//!
//! - [`memory`] - in-memory key-value store
//! - [`file`] - file-per-key store on the local filesystem
//! - [`command`] - child-process execution with timeout enforcement
//! - [`venv`] - Python virtualenv isolated-environment provider
//! - [`registry`] - PyPI-backed version source (feature `http`)
//! - [`log_notifier`] - notification sink that writes to the log

pub mod command;
pub mod file;
pub mod log_notifier;
pub mod memory;
#[cfg(feature = "http")]
pub mod registry;
pub mod venv;

pub use command::run_with_timeout;
pub use file::FileStore;
pub use log_notifier::LogNotifier;
pub use memory::MemoryStore;
#[cfg(feature = "http")]
pub use registry::PyPiVersionSource;
pub use venv::VenvEnvironmentProvider;
