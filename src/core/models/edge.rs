//! Dependency edge model
//!
//! An edge declares: "When this upstream package releases a new version,
//! run this downstream package's tests against it."

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An upstream→downstream relationship in the dependency graph
///
/// Edges are unique per (upstream, downstream) pair. Re-registering an
/// existing pair replaces the edge in place and resets `registered_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Package whose releases trigger testing
    pub upstream: String,

    /// Package whose tests run against the new upstream version
    pub downstream: String,

    /// Version constraint, stored as an opaque string (e.g. ">=1.0.0").
    /// downwind never resolves or enforces it.
    #[serde(default)]
    pub constraint: String,

    /// Command executed inside the isolated environment to run the
    /// downstream's tests
    pub test_command: String,

    /// When this edge was (last) registered
    pub registered_at: DateTime<Utc>,

    /// Open-ended extras: contact, repo URL, and similar
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl DependencyEdge {
    /// Create a new edge registered now, with empty metadata
    #[must_use]
    pub fn new(upstream: &str, downstream: &str, constraint: &str, test_command: &str) -> Self {
        Self {
            upstream: upstream.to_string(),
            downstream: downstream.to_string(),
            constraint: constraint.to_string(),
            test_command: test_command.to_string(),
            registered_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach metadata entries, replacing any existing map
    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}
