//! Port traits (interfaces) for external dependencies
//!
//! These traits define the boundaries between core business logic and
//! external systems (persistence, package installation sandboxes, version
//! registries, alerting channels).
//!
//! Implementations live in the `adapters` module.
//!
//! ## Design Principle
//!
//! The core domain logic depends only on these traits, never on concrete
//! implementations. This enables:
//!
//! - **Testability**: Mock implementations for unit tests
//! - **Flexibility**: Swap implementations without changing business logic
//! - **Clarity**: Clear boundaries between layers

mod environment;
mod kv_store;
mod notifier;
mod version_source;

pub use environment::{Environment, EnvironmentProvider, InstallOutcome, RunOutcome};
pub use kv_store::{KvStore, StoreError};
pub use notifier::Notifier;
pub use version_source::VersionSource;
