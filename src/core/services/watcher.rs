//! Version watcher service
//!
//! Polls an external version source per package and diffs against the
//! stored last-seen state. A failed fetch is a transient condition: it
//! yields no observation and leaves stored state untouched, so nothing is
//! silently lost between cycles.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, warn};

use crate::core::models::{VersionChange, VersionRecord};
use crate::core::ports::{KvStore, StoreError, VersionSource};

/// Result of one poll for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The source reported a version different from the stored one; the
    /// new value has been persisted
    Changed(VersionChange),
    /// The source reported the same version already stored
    Unchanged,
    /// The source could not be consulted (transient) or does not know the
    /// package; stored state is untouched
    NoObservation,
}

/// Watches packages for new releases
pub struct VersionWatcher {
    source: Arc<dyn VersionSource>,
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for VersionWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionWatcher").finish_non_exhaustive()
    }
}

impl VersionWatcher {
    /// Create a watcher over a version source and a store of
    /// [`VersionRecord`]s keyed by package name
    #[must_use]
    pub fn new(source: Arc<dyn VersionSource>, store: Arc<dyn KvStore>) -> Self {
        Self { source, store }
    }

    /// Last-seen version for a package, if one has been recorded
    pub fn stored_version(&self, package: &str) -> anyhow::Result<Option<String>> {
        Ok(self.load_record(package)?.map(|r| r.last_seen_version))
    }

    /// Poll the source once for one package
    ///
    /// Fetch failures are reported as [`PollOutcome::NoObservation`] and
    /// retried on the next cycle; only storage failures are errors.
    pub fn poll_once(&self, package: &str) -> anyhow::Result<PollOutcome> {
        let latest = match self.source.latest_version(package) {
            Ok(Some(version)) => version,
            Ok(None) => {
                warn!("version source does not know package {package}");
                return Ok(PollOutcome::NoObservation);
            },
            Err(e) => {
                warn!("fetch failed for {package}: {e:#}");
                return Ok(PollOutcome::NoObservation);
            },
        };

        let stored = self.stored_version(package)?;
        self.save_record(&VersionRecord::new(package, &latest))?;

        if stored.as_deref() == Some(latest.as_str()) {
            debug!("{package} unchanged at {latest}");
            return Ok(PollOutcome::Unchanged);
        }

        info!(
            "{package}: {} -> {latest}",
            stored.as_deref().unwrap_or("(first observation)")
        );
        Ok(PollOutcome::Changed(VersionChange {
            package: package.to_string(),
            old: stored,
            new: latest,
        }))
    }

    /// Poll every package once, returning the changes detected
    pub fn check_for_updates(
        &self,
        packages: &[String],
    ) -> anyhow::Result<BTreeMap<String, VersionChange>> {
        let mut updates = BTreeMap::new();
        for package in packages {
            if let PollOutcome::Changed(change) = self.poll_once(package)? {
                updates.insert(package.clone(), change);
            }
        }
        Ok(updates)
    }

    /// Blocking poll loop
    ///
    /// Calls `on_update` per detected change, then sleeps for `interval`.
    /// The shutdown flag is honored at the top of each iteration, never
    /// mid-batch.
    pub fn watch_continuously(
        &self,
        packages: &[String],
        interval: Duration,
        shutdown: &AtomicBool,
        mut on_update: impl FnMut(&VersionChange),
    ) -> anyhow::Result<()> {
        info!("watching {} packages every {}s", packages.len(), interval.as_secs());
        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("watch loop shutting down");
                return Ok(());
            }
            let updates = self.check_for_updates(packages)?;
            for change in updates.values() {
                on_update(change);
            }
            sleep_interruptible(interval, shutdown);
        }
    }

    fn load_record(&self, package: &str) -> anyhow::Result<Option<VersionRecord>> {
        match self.store.get(package)? {
            Some(raw) => {
                let record = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                    key: package.to_string(),
                    source,
                })?;
                Ok(Some(record))
            },
            None => Ok(None),
        }
    }

    fn save_record(&self, record: &VersionRecord) -> anyhow::Result<()> {
        let raw = serde_json::to_string(record)?;
        self.store.set(&record.package, &raw)?;
        Ok(())
    }
}

/// Sleep up to `interval`, waking early once the shutdown flag is set
pub(crate) fn sleep_interruptible(interval: Duration, shutdown: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(50);
    let deadline = std::time::Instant::now() + interval;
    while std::time::Instant::now() < deadline {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }
        std::thread::sleep(SLICE.min(deadline.saturating_duration_since(std::time::Instant::now())));
    }
}
