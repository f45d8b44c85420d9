//! Scripted port implementations for exercising the core services
//!
//! The mock environments interpret their test commands directly: `exit N`
//! yields exit code N, `hang` simulates hitting the timeout, anything
//! else exits 0.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use downwind::adapters::MemoryStore;
use downwind::core::models::{DependencyEdge, TestResult, VersionChange};
use downwind::core::ports::{
    Environment, EnvironmentProvider, InstallOutcome, KvStore, Notifier, RunOutcome, StoreError,
    VersionSource,
};

/// Shorthand for an edge with an empty constraint
pub fn edge(upstream: &str, downstream: &str, test_command: &str) -> DependencyEdge {
    DependencyEdge::new(upstream, downstream, "", test_command)
}

/// Counters shared between a provider and every environment it hands out
#[derive(Default)]
struct ProviderState {
    active: AtomicUsize,
    max_active: AtomicUsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

/// Environment provider with scripted install/run behavior
#[derive(Default)]
pub struct MockEnvironmentProvider {
    state: Arc<ProviderState>,
    fail_install_of: Option<String>,
    fail_acquire: bool,
    hold: Duration,
}

impl MockEnvironmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make installs of the named package report failure
    pub fn fail_installs_of(mut self, package: &str) -> Self {
        self.fail_install_of = Some(package.to_string());
        self
    }

    /// Make every acquire fail outright
    pub fn fail_acquire(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    /// Make every run stall for the given duration, so overlap between
    /// concurrent jobs becomes observable
    pub fn hold_jobs_for(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }

    /// High-water mark of simultaneously live environments
    pub fn max_concurrent(&self) -> usize {
        self.state.max_active.load(Ordering::SeqCst)
    }

    /// Every install/run/version call, in observed order
    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }
}

impl EnvironmentProvider for MockEnvironmentProvider {
    fn acquire(&self) -> anyhow::Result<Box<dyn Environment>> {
        if self.fail_acquire {
            anyhow::bail!("simulated provisioning failure");
        }
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        let now_active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_active.fetch_max(now_active, Ordering::SeqCst);
        Ok(Box::new(MockEnvironment {
            state: Arc::clone(&self.state),
            fail_install_of: self.fail_install_of.clone(),
            hold: self.hold,
        }))
    }
}

struct MockEnvironment {
    state: Arc<ProviderState>,
    fail_install_of: Option<String>,
    hold: Duration,
}

impl MockEnvironment {
    fn record(&self, call: String) {
        self.state.calls.lock().unwrap().push(call);
    }
}

impl Drop for MockEnvironment {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::SeqCst);
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl Environment for MockEnvironment {
    fn install(&mut self, package: &str, version: Option<&str>) -> anyhow::Result<InstallOutcome> {
        match version {
            Some(v) => self.record(format!("install {package} {v}")),
            None => self.record(format!("install {package}")),
        }
        if self.fail_install_of.as_deref() == Some(package) {
            return Ok(InstallOutcome {
                success: false,
                output: "simulated installer rejection".to_string(),
            });
        }
        Ok(InstallOutcome {
            success: true,
            output: format!("installed {package}"),
        })
    }

    fn installed_version(&mut self, package: &str) -> Option<String> {
        self.record(format!("version {package}"));
        Some("9.9.9".to_string())
    }

    fn run(&mut self, command: &str, _timeout: Duration) -> anyhow::Result<RunOutcome> {
        self.record(format!("run {command}"));
        if !self.hold.is_zero() {
            std::thread::sleep(self.hold);
        }
        let outcome = if command == "hang" {
            RunOutcome {
                exit_code: None,
                output: "no output before timeout".to_string(),
                timed_out: true,
            }
        } else if let Some(code) = command.strip_prefix("exit ") {
            let code: i32 = code.trim().parse().expect("scripted exit code");
            RunOutcome {
                exit_code: Some(code),
                output: format!("exited {code}"),
                timed_out: false,
            }
        } else {
            RunOutcome {
                exit_code: Some(0),
                output: "ok".to_string(),
                timed_out: false,
            }
        };
        Ok(outcome)
    }

    fn describe(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("provider".to_string(), "mock".to_string())])
    }
}

/// Version source reading from an in-memory registry
#[derive(Default)]
pub struct MockVersionSource {
    versions: Mutex<BTreeMap<String, String>>,
    failing: AtomicBool,
}

impl MockVersionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given version the latest published one
    pub fn publish(&self, package: &str, version: &str) {
        self.versions.lock().unwrap().insert(package.to_string(), version.to_string());
    }

    /// Toggle transient fetch failures
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl VersionSource for MockVersionSource {
    fn latest_version(&self, package: &str) -> anyhow::Result<Option<String>> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("simulated registry outage");
        }
        Ok(self.versions.lock().unwrap().get(package).cloned())
    }
}

/// Notifier that records every batch it is handed
#[derive(Default)]
pub struct CollectingNotifier {
    batches: Mutex<Vec<(VersionChange, Vec<TestResult>)>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(VersionChange, Vec<TestResult>)> {
        self.batches.lock().unwrap().clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, change: &VersionChange, results: &[TestResult]) {
        self.batches.lock().unwrap().push((change.clone(), results.to_vec()));
    }
}

/// Store whose writes can be made to fail, for storage-error paths
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

impl KvStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("simulated write failure")));
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys()
    }
}
