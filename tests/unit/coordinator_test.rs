//! Coordinator cycle and in-flight dedup behavior

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use downwind::adapters::MemoryStore;
use downwind::core::models::TestStatus;
use downwind::core::ports::{Notifier, VersionSource};
use downwind::core::services::{
    Coordinator, DependencyGraph, ResultsLedger, TestOrchestrator, VersionWatcher,
};

use crate::common::init_logging;
use crate::common::mocks::{CollectingNotifier, MockEnvironmentProvider, MockVersionSource};

struct Harness {
    coordinator: Arc<Coordinator>,
    graph: Arc<DependencyGraph>,
    ledger: Arc<ResultsLedger>,
    source: Arc<MockVersionSource>,
    notifier: Arc<CollectingNotifier>,
}

fn harness(provider: Arc<MockEnvironmentProvider>) -> Harness {
    init_logging();
    let graph = Arc::new(DependencyGraph::new(Arc::new(MemoryStore::new())));
    let ledger = Arc::new(ResultsLedger::new(Arc::new(MemoryStore::new())));
    let source = Arc::new(MockVersionSource::new());
    let watcher =
        Arc::new(VersionWatcher::new(
            Arc::clone(&source) as Arc<dyn VersionSource>,
            Arc::new(MemoryStore::new()),
        ));
    let orchestrator = Arc::new(TestOrchestrator::new(provider, Arc::clone(&ledger)));
    let notifier = Arc::new(CollectingNotifier::new());
    let coordinator = Arc::new(Coordinator::new(
        Arc::clone(&graph),
        watcher,
        orchestrator,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    ));
    Harness {
        coordinator,
        graph,
        ledger,
        source,
        notifier,
    }
}

#[test]
fn test_cycle_dispatches_and_notifies_on_change() {
    let h = harness(Arc::new(MockEnvironmentProvider::new()));
    h.graph.register("alpha", "beta", "", "exit 0", BTreeMap::new()).unwrap();
    h.graph.register("alpha", "gamma", "", "exit 0", BTreeMap::new()).unwrap();
    h.source.publish("alpha", "1.1.0");

    let batches = h.coordinator.run_cycle(&["alpha".to_string()]).unwrap();

    assert_eq!(batches.len(), 1);
    assert_eq!(batches["alpha"].len(), 2);
    assert_eq!(h.ledger.len().unwrap(), 2);

    let notifications = h.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0.package, "alpha");
    assert_eq!(notifications[0].0.old, None);
    assert_eq!(notifications[0].0.new, "1.1.0");
    assert_eq!(notifications[0].1.len(), 2);
}

#[test]
fn test_quiet_cycle_dispatches_nothing() {
    let h = harness(Arc::new(MockEnvironmentProvider::new()));
    h.graph.register("alpha", "beta", "", "exit 0", BTreeMap::new()).unwrap();
    h.source.publish("alpha", "1.1.0");

    h.coordinator.run_cycle(&["alpha".to_string()]).unwrap();
    let second = h.coordinator.run_cycle(&["alpha".to_string()]).unwrap();

    assert!(second.is_empty());
    assert_eq!(h.ledger.len().unwrap(), 1);
    assert_eq!(h.notifier.notifications().len(), 1);
}

#[test]
fn test_fetch_failure_makes_cycle_a_noop() {
    let h = harness(Arc::new(MockEnvironmentProvider::new()));
    h.graph.register("alpha", "beta", "", "exit 0", BTreeMap::new()).unwrap();
    h.source.set_failing(true);

    let batches = h.coordinator.run_cycle(&["alpha".to_string()]).unwrap();

    assert!(batches.is_empty());
    assert!(h.ledger.is_empty().unwrap());
    assert!(h.notifier.notifications().is_empty());
}

#[test]
fn test_dispatch_without_dependents_is_empty() {
    let h = harness(Arc::new(MockEnvironmentProvider::new()));
    let results = h.coordinator.dispatch("alpha", "1.0.0").unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_concurrent_dispatch_skips_in_flight_triples() {
    let provider =
        Arc::new(MockEnvironmentProvider::new().hold_jobs_for(Duration::from_millis(200)));
    let h = harness(provider);
    h.graph.register("alpha", "beta", "", "exit 0", BTreeMap::new()).unwrap();

    let background = {
        let coordinator = Arc::clone(&h.coordinator);
        std::thread::spawn(move || coordinator.dispatch("alpha", "2.0.0"))
    };
    // Let the background dispatch claim the triple before racing it
    std::thread::sleep(Duration::from_millis(50));

    let duplicate = h.coordinator.dispatch("alpha", "2.0.0").unwrap();
    assert_eq!(duplicate.len(), 1);
    assert_eq!(duplicate[0].status, TestStatus::Skip);
    assert!(duplicate[0].output.contains("already in flight"));

    let original = background.join().unwrap().unwrap();
    assert_eq!(original.len(), 1);
    assert_eq!(original[0].status, TestStatus::Pass);

    // Only the real run reached the ledger
    assert_eq!(h.ledger.len().unwrap(), 1);
}

#[test]
fn test_triple_is_free_again_after_completion() {
    let h = harness(Arc::new(MockEnvironmentProvider::new()));
    h.graph.register("alpha", "beta", "", "exit 0", BTreeMap::new()).unwrap();

    let first = h.coordinator.dispatch("alpha", "2.0.0").unwrap();
    let second = h.coordinator.dispatch("alpha", "2.0.0").unwrap();

    assert_eq!(first[0].status, TestStatus::Pass);
    assert_eq!(second[0].status, TestStatus::Pass);
    assert_eq!(h.ledger.len().unwrap(), 2);
}

#[test]
fn test_run_loop_honors_preset_shutdown() {
    let h = harness(Arc::new(MockEnvironmentProvider::new()));
    let shutdown = AtomicBool::new(true);

    h.coordinator
        .run(&["alpha".to_string()], Duration::from_millis(10), &shutdown)
        .unwrap();
    assert!(h.notifier.notifications().is_empty());
}
