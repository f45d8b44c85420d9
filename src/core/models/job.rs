//! Test job model

use std::time::Duration;

use super::DependencyEdge;

/// One transient unit of orchestrated work: test a single dependent against
/// a single upstream version
///
/// Jobs are built per dispatch, owned exclusively by the worker executing
/// them, and discarded after the result is recorded. They are never
/// persisted.
#[derive(Debug, Clone)]
pub struct TestJob {
    /// Package whose new version triggered this job
    pub upstream: String,

    /// The version under test
    pub upstream_version: String,

    /// Dependent package whose tests will run
    pub downstream: String,

    /// Opaque constraint carried from the edge, passed to the installer
    pub constraint: String,

    /// Test command to execute in the isolated environment
    pub test_command: String,

    /// Hard limit on test command execution
    pub timeout: Duration,
}

impl TestJob {
    /// Build a job from a registered edge and the version under test
    #[must_use]
    pub fn from_edge(edge: &DependencyEdge, upstream_version: &str, timeout: Duration) -> Self {
        Self {
            upstream: edge.upstream.clone(),
            upstream_version: upstream_version.to_string(),
            downstream: edge.downstream.clone(),
            constraint: edge.constraint.clone(),
            test_command: edge.test_command.clone(),
            timeout,
        }
    }
}
