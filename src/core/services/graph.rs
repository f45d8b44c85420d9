//! Dependency graph service
//!
//! Persists edges through the [`KvStore`] port, keyed by upstream package
//! name. The value under each key is the JSON array of that upstream's
//! edges, so one `dependents_of` read is always a consistent point-in-time
//! snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};

use crate::core::models::DependencyEdge;
use crate::core::ports::{KvStore, StoreError};

/// Registry of upstream→downstream dependency edges
pub struct DependencyGraph {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph").finish_non_exhaustive()
    }
}

impl DependencyGraph {
    /// Create a graph over the given store
    ///
    /// The store should be dedicated to graph data: every key is treated as
    /// an upstream package name.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Register a dependent, upserting in place
    ///
    /// Idempotent: registering an existing (upstream, downstream) pair
    /// replaces the edge and resets `registered_at`. Returns the stored
    /// edge.
    pub fn register(
        &self,
        upstream: &str,
        downstream: &str,
        constraint: &str,
        test_command: &str,
        metadata: BTreeMap<String, String>,
    ) -> anyhow::Result<DependencyEdge> {
        let edge =
            DependencyEdge::new(upstream, downstream, constraint, test_command).with_metadata(metadata);

        let mut edges = self.load_edges(upstream)?;
        edges.retain(|e| e.downstream != downstream);
        edges.push(edge.clone());
        self.save_edges(upstream, &edges)?;

        info!("registered edge {upstream} -> {downstream}");
        Ok(edge)
    }

    /// Remove an edge; removing an absent edge is a no-op
    pub fn unregister(&self, upstream: &str, downstream: &str) -> anyhow::Result<()> {
        let mut edges = self.load_edges(upstream)?;
        let len_before = edges.len();
        edges.retain(|e| e.downstream != downstream);

        if edges.len() == len_before {
            debug!("unregister {upstream} -> {downstream}: no such edge");
            return Ok(());
        }

        if edges.is_empty() {
            self.store.delete(upstream)?;
        } else {
            self.save_edges(upstream, &edges)?;
        }
        info!("unregistered edge {upstream} -> {downstream}");
        Ok(())
    }

    /// All edges for an upstream package, empty for an unknown upstream
    pub fn dependents_of(&self, upstream: &str) -> anyhow::Result<Vec<DependencyEdge>> {
        self.load_edges(upstream)
    }

    /// Flatten every registered edge, for discovery and auditing
    pub fn all_edges(&self) -> anyhow::Result<Vec<DependencyEdge>> {
        let mut all = Vec::new();
        for upstream in self.store.keys()? {
            all.extend(self.load_edges(&upstream)?);
        }
        Ok(all)
    }

    /// Total number of registered edges
    pub fn len(&self) -> anyhow::Result<usize> {
        Ok(self.all_edges()?.len())
    }

    /// Whether the graph holds no edges at all
    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.store.keys()?.is_empty())
    }

    fn load_edges(&self, upstream: &str) -> anyhow::Result<Vec<DependencyEdge>> {
        match self.store.get(upstream)? {
            Some(raw) => {
                let edges = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                    key: upstream.to_string(),
                    source,
                })?;
                Ok(edges)
            },
            None => Ok(Vec::new()),
        }
    }

    fn save_edges(&self, upstream: &str, edges: &[DependencyEdge]) -> anyhow::Result<()> {
        let raw = serde_json::to_string(edges)?;
        self.store.set(upstream, &raw)?;
        Ok(())
    }
}
