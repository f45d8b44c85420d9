//! Domain records
//!
//! - [`DependencyEdge`] - a registered upstream→downstream relationship
//! - [`TestJob`] - one transient unit of orchestrated work
//! - [`TestResult`] / [`TestStatus`] - the recorded outcome of a job
//! - [`VersionRecord`] / [`VersionChange`] - last-seen state and detected
//!   deltas for a watched package

mod edge;
mod job;
mod result;
mod version;

pub use edge::DependencyEdge;
pub use job::TestJob;
pub use result::{TestResult, TestStatus};
pub use version::{VersionChange, VersionRecord};
