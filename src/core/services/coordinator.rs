//! Coordinator service
//!
//! Drives the poll→diff→dispatch loop: watcher output becomes orchestrator
//! input, and completed batches are handed to the notification sink. Each
//! poll cycle is fully drained before the next begins.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};

use crate::core::models::{TestResult, TestStatus, VersionChange};
use crate::core::ports::Notifier;
use crate::core::services::watcher::sleep_interruptible;
use crate::core::services::{DependencyGraph, TestOrchestrator, VersionWatcher};

type JobTriple = (String, String, String);

/// Ties the version watcher, dependency graph, orchestrator, and notifier
/// together
pub struct Coordinator {
    graph: Arc<DependencyGraph>,
    watcher: Arc<VersionWatcher>,
    orchestrator: Arc<TestOrchestrator>,
    notifier: Arc<dyn Notifier>,
    /// (upstream, downstream, version) triples currently being tested.
    /// Guarantees at most one outstanding job per triple, so duplicate
    /// dispatches never race over a shared install cache.
    in_flight: Mutex<HashSet<JobTriple>>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator").finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Assemble a coordinator from its collaborators
    #[must_use]
    pub fn new(
        graph: Arc<DependencyGraph>,
        watcher: Arc<VersionWatcher>,
        orchestrator: Arc<TestOrchestrator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            graph,
            watcher,
            orchestrator,
            notifier,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Test all current dependents of an upstream version
    ///
    /// Takes one snapshot of the graph; edges registered afterwards are
    /// picked up on the next cycle. Triples already in flight are not
    /// re-dispatched: they yield `skip` results in the returned batch, but
    /// only the claimed run writes the pair's outcome to the ledger.
    pub fn dispatch(&self, upstream: &str, version: &str) -> anyhow::Result<Vec<TestResult>> {
        let snapshot = self.graph.dependents_of(upstream)?;
        if snapshot.is_empty() {
            debug!("no registered dependents for {upstream}");
            return Ok(Vec::new());
        }

        let mut claimed = Vec::new();
        let mut skipped = Vec::new();
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| anyhow::anyhow!("in-flight guard poisoned"))?;
            for edge in snapshot {
                let triple =
                    (upstream.to_string(), edge.downstream.clone(), version.to_string());
                if in_flight.insert(triple) {
                    claimed.push(edge);
                } else {
                    skipped.push(edge);
                }
            }
        }

        let batch = self.orchestrator.run_batch(upstream, version, &claimed);

        // Release claims regardless of how the batch ended
        if let Ok(mut in_flight) = self.in_flight.lock() {
            for edge in &claimed {
                in_flight.remove(&(
                    upstream.to_string(),
                    edge.downstream.clone(),
                    version.to_string(),
                ));
            }
        }

        let mut results = batch?;
        for edge in skipped {
            info!("skipping {}: already being tested against {upstream} {version}", edge.downstream);
            results.push(skip_result(upstream, version, &edge.downstream, &edge.test_command));
        }
        Ok(results)
    }

    /// One full poll→diff→dispatch→notify cycle over the given packages
    ///
    /// Returns the changes processed with their batches, fully drained.
    pub fn run_cycle(
        &self,
        packages: &[String],
    ) -> anyhow::Result<BTreeMap<String, Vec<TestResult>>> {
        let changes = self.watcher.check_for_updates(packages)?;
        let mut batches = BTreeMap::new();
        for change in changes.values() {
            let results = self.dispatch(&change.package, &change.new)?;
            self.notifier.notify(change, &results);
            batches.insert(change.package.clone(), results);
        }
        Ok(batches)
    }

    /// Blocking coordination loop
    ///
    /// Shutdown is honored only at poll-cycle boundaries: in-flight jobs
    /// finish and their results are recorded before the loop exits.
    pub fn run(
        &self,
        packages: &[String],
        interval: Duration,
        shutdown: &AtomicBool,
    ) -> anyhow::Result<()> {
        info!(
            "coordinating {} packages every {}s",
            packages.len(),
            interval.as_secs()
        );
        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("coordinator shutting down");
                return Ok(());
            }
            let batches = self.run_cycle(packages)?;
            if !batches.is_empty() {
                info!("cycle dispatched {} batches", batches.len());
            }
            sleep_interruptible(interval, shutdown);
        }
    }
}

/// Result recorded for a job filtered out before dispatch
fn skip_result(upstream: &str, version: &str, downstream: &str, test_command: &str) -> TestResult {
    let now = Utc::now();
    TestResult {
        id: TestResult::generate_id(),
        upstream_package: upstream.to_string(),
        upstream_version: version.to_string(),
        downstream_package: downstream.to_string(),
        downstream_version: "unknown".to_string(),
        test_command: test_command.to_string(),
        status: TestStatus::Skip,
        started_at: now,
        finished_at: now,
        output: "skipped: an identical job was already in flight".to_string(),
        exit_code: None,
        environment: BTreeMap::new(),
    }
}
