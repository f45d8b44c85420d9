//! Results ledger service
//!
//! An append-only log of test outcomes, keyed by globally unique result
//! id. Entries are immutable once written; concurrent appends under
//! distinct ids never contend on the same key.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;

use crate::core::models::{TestResult, TestStatus};
use crate::core::ports::{KvStore, StoreError};

/// Conjunctive, all-optional filters for [`ResultsLedger::query`]
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    /// Match on upstream package name
    pub upstream: Option<String>,
    /// Match on downstream package name
    pub downstream: Option<String>,
    /// Match on outcome status
    pub status: Option<TestStatus>,
    /// Keep only results started at or after this instant
    pub after: Option<DateTime<Utc>>,
}

impl ResultFilter {
    /// Filter matching every result
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict to an upstream package
    #[must_use]
    pub fn with_upstream(mut self, name: &str) -> Self {
        self.upstream = Some(name.to_string());
        self
    }

    /// Restrict to a downstream package
    #[must_use]
    pub fn with_downstream(mut self, name: &str) -> Self {
        self.downstream = Some(name.to_string());
        self
    }

    /// Restrict to one status
    #[must_use]
    pub const fn with_status(mut self, status: TestStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to results started at or after the given instant
    #[must_use]
    pub const fn with_after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self
    }

    fn matches(&self, result: &TestResult) -> bool {
        if self.upstream.as_deref().is_some_and(|u| u != result.upstream_package) {
            return false;
        }
        if self.downstream.as_deref().is_some_and(|d| d != result.downstream_package) {
            return false;
        }
        if self.status.is_some_and(|s| s != result.status) {
            return false;
        }
        if self.after.is_some_and(|t| result.started_at < t) {
            return false;
        }
        true
    }
}

/// Counts of ledger entries by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    /// Total matching entries
    pub total: usize,
    /// Entries with status `pass`
    pub passed: usize,
    /// Entries with status `fail`
    pub failed: usize,
    /// Entries with status `error`
    pub errored: usize,
    /// Entries with status `skip`
    pub skipped: usize,
}

/// Durable, queryable log of all past test outcomes
pub struct ResultsLedger {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for ResultsLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultsLedger").finish_non_exhaustive()
    }
}

impl ResultsLedger {
    /// Create a ledger over the given store
    ///
    /// The store should be dedicated to ledger data: every key is treated
    /// as a result id.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Append a new result
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the id is already
    /// present: entries are immutable, never overwritten.
    pub fn append(&self, result: &TestResult) -> anyhow::Result<()> {
        if self.store.contains(&result.id)? {
            return Err(StoreError::AlreadyExists(result.id.clone()).into());
        }
        let raw = serde_json::to_string(result)?;
        self.store.set(&result.id, &raw)?;
        debug!(
            "recorded {} for {} against {} {}",
            result.status, result.downstream_package, result.upstream_package, result.upstream_version
        );
        Ok(())
    }

    /// Look up a single result by id
    pub fn get(&self, id: &str) -> anyhow::Result<Option<TestResult>> {
        match self.store.get(id)? {
            Some(raw) => Ok(Some(decode(id, &raw)?)),
            None => Ok(None),
        }
    }

    /// The full set of results matching the filter
    pub fn query(&self, filter: &ResultFilter) -> anyhow::Result<Vec<TestResult>> {
        let mut matching = Vec::new();
        for id in self.store.keys()? {
            if let Some(raw) = self.store.get(&id)? {
                let result = decode(&id, &raw)?;
                if filter.matches(&result) {
                    matching.push(result);
                }
            }
        }
        Ok(matching)
    }

    /// Most recent result for a package pair
    ///
    /// Greatest `started_at` wins; ties break on lexicographic id order so
    /// the answer is total and reproducible.
    pub fn latest_result(
        &self,
        upstream: &str,
        downstream: &str,
    ) -> anyhow::Result<Option<TestResult>> {
        let filter = ResultFilter::any().with_upstream(upstream).with_downstream(downstream);
        let results = self.query(&filter)?;
        Ok(results.into_iter().max_by(|a, b| {
            a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id))
        }))
    }

    /// Count entries matching the filter, broken down by status
    pub fn summarize(&self, filter: &ResultFilter) -> anyhow::Result<LedgerSummary> {
        let mut summary = LedgerSummary::default();
        for result in self.query(filter)? {
            summary.total += 1;
            match result.status {
                TestStatus::Pass => summary.passed += 1,
                TestStatus::Fail => summary.failed += 1,
                TestStatus::Error => summary.errored += 1,
                TestStatus::Skip => summary.skipped += 1,
            }
        }
        Ok(summary)
    }

    /// Total number of recorded results
    pub fn len(&self) -> anyhow::Result<usize> {
        Ok(self.store.keys()?.len())
    }

    /// Whether the ledger holds no results
    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.store.keys()?.is_empty())
    }
}

fn decode(id: &str, raw: &str) -> Result<TestResult, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Corrupt {
        key: id.to_string(),
        source,
    })
}
