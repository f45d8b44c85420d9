//! Isolated execution environment port
//!
//! An environment is a disposable sandbox with an explicit lifecycle:
//! acquire, install packages, run the test command, release. Release
//! happens in `Drop`, so it is guaranteed on every exit path: success,
//! failure, timeout, or panic unwind.

use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of a package install attempt
///
/// `Ok(InstallOutcome { success: false, .. })` means the installer itself
/// ran and rejected the package; an `Err` from [`Environment::install`]
/// means the installer could not even be invoked. The orchestrator treats
/// both as a job-level `error`.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Whether the install succeeded
    pub success: bool,
    /// Captured installer diagnostics
    pub output: String,
}

/// Outcome of running a command inside the environment
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Exit code, `None` when the process was killed before exiting
    /// normally
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr. Byte-level interleaving across the two
    /// streams is not guaranteed, but nothing is dropped.
    pub output: String,
    /// Whether the command was forcibly terminated at the timeout
    pub timed_out: bool,
}

/// A single acquired sandbox
///
/// Owned exclusively by the worker running one job. Dropping the value
/// releases all resources the environment holds.
pub trait Environment: Send {
    /// Install a package, optionally pinned to a version or constraint
    fn install(&mut self, package: &str, version: Option<&str>) -> anyhow::Result<InstallOutcome>;

    /// Best-effort lookup of the installed version of a package
    ///
    /// `None` is an acceptable answer, not a failure.
    fn installed_version(&mut self, package: &str) -> Option<String>;

    /// Run a command under the given timeout, capturing combined output
    fn run(&mut self, command: &str, timeout: Duration) -> anyhow::Result<RunOutcome>;

    /// Metadata describing this environment, recorded on the result
    fn describe(&self) -> BTreeMap<String, String>;
}

/// Factory for fresh isolated environments
pub trait EnvironmentProvider: Send + Sync {
    /// Provision a new, empty environment
    fn acquire(&self) -> anyhow::Result<Box<dyn Environment>>;
}
