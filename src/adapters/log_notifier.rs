//! Log-backed notification sink
//!
//! Writes a one-line batch summary to the log. Stands in for external
//! alerting channels (chat, issue trackers, email), which are wired up
//! outside this crate.

use log::{info, warn};

use crate::core::models::{TestResult, TestStatus, VersionChange};
use crate::core::ports::Notifier;

/// Notifier that reports batches through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create the notifier
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, change: &VersionChange, results: &[TestResult]) {
        let passed = results.iter().filter(|r| r.status == TestStatus::Pass).count();
        let failed = results.iter().filter(|r| r.status == TestStatus::Fail).count();
        let errored = results.iter().filter(|r| r.status == TestStatus::Error).count();

        let old = change.old.as_deref().unwrap_or("(new)");
        if failed + errored > 0 {
            warn!(
                "{} {old} -> {}: {} dependents tested, {passed} passed, {failed} failed, {errored} errored",
                change.package,
                change.new,
                results.len()
            );
        } else {
            info!(
                "{} {old} -> {}: all {} dependents passed",
                change.package,
                change.new,
                results.len()
            );
        }
    }
}
