//! Test orchestrator service
//!
//! Given an upstream package/version and a set of dependent edges, runs
//! each dependent's test suite in a fresh isolated environment and
//! produces exactly one [`TestResult`] per dependent, no matter which
//! pipeline stage fails.
//!
//! Jobs fan out over a bounded worker pool. Sibling jobs are fully
//! independent: a provisioning failure, install failure, test failure, or
//! timeout in one job never cancels or delays another beyond queueing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::core::models::{DependencyEdge, TestJob, TestResult, TestStatus};
use crate::core::ports::{Environment, EnvironmentProvider};
use crate::core::services::ResultsLedger;

/// Default worker pool width
pub const DEFAULT_POOL_WIDTH: usize = 3;

/// Default per-job test timeout
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Runs dependent test suites in isolated environments
pub struct TestOrchestrator {
    provider: Arc<dyn EnvironmentProvider>,
    ledger: Arc<ResultsLedger>,
    pool_width: usize,
    timeout: Duration,
}

impl std::fmt::Debug for TestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestOrchestrator")
            .field("pool_width", &self.pool_width)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TestOrchestrator {
    /// Create an orchestrator with default pool width and timeout
    #[must_use]
    pub fn new(provider: Arc<dyn EnvironmentProvider>, ledger: Arc<ResultsLedger>) -> Self {
        Self {
            provider,
            ledger,
            pool_width: DEFAULT_POOL_WIDTH,
            timeout: DEFAULT_TEST_TIMEOUT,
        }
    }

    /// Set the worker pool width (clamped to at least 1)
    #[must_use]
    pub fn with_pool_width(mut self, width: usize) -> Self {
        self.pool_width = width.max(1);
        self
    }

    /// Set the per-job test timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Test every edge against the given upstream version
    ///
    /// Returns exactly one result per edge, in no guaranteed order, each
    /// already appended to the ledger. Per-job failures become `error` or
    /// `fail` entries; only a ledger write failure is a hard error, and
    /// even then every submitted job runs to completion first.
    pub fn run_batch(
        &self,
        upstream: &str,
        upstream_version: &str,
        edges: &[DependencyEdge],
    ) -> anyhow::Result<Vec<TestResult>> {
        if edges.is_empty() {
            return Ok(Vec::new());
        }

        let jobs: Vec<TestJob> =
            edges.iter().map(|e| TestJob::from_edge(e, upstream_version, self.timeout)).collect();
        let width = self.pool_width.min(jobs.len());
        info!(
            "dispatching {} jobs for {upstream} {upstream_version} across {width} workers",
            jobs.len()
        );

        // Submission blocks once all workers are busy
        let (job_tx, job_rx) = crossbeam_channel::bounded::<TestJob>(width);
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<anyhow::Result<TestResult>>();

        let mut outcomes: Vec<anyhow::Result<TestResult>> = Vec::with_capacity(jobs.len());
        std::thread::scope(|scope| {
            for _ in 0..width {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                scope.spawn(move || {
                    for job in &job_rx {
                        let result = self.execute(&job);
                        let recorded = self.ledger.append(&result).map(|()| result);
                        if done_tx.send(recorded).is_err() {
                            return;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(done_tx);

            for job in jobs {
                if job_tx.send(job).is_err() {
                    // All workers gone; the drained channel below reports
                    // whatever completed
                    break;
                }
            }
            drop(job_tx);

            outcomes.extend(done_rx.iter());
        });

        let mut results = Vec::with_capacity(outcomes.len());
        let mut storage_failure = None;
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => storage_failure = Some(e),
            }
        }
        if let Some(e) = storage_failure {
            return Err(e.context("failed to record batch results"));
        }
        Ok(results)
    }

    /// Run a single job and record its result
    pub fn run_single(&self, job: &TestJob) -> anyhow::Result<TestResult> {
        let result = self.execute(job);
        self.ledger.append(&result)?;
        Ok(result)
    }

    /// The per-job pipeline; always yields a result
    ///
    /// Stage order is strict: acquire, install upstream pinned, install
    /// downstream, resolve downstream version, run tests. Any failure
    /// before execution short-circuits to an `error` result. The
    /// environment is released by `Drop` on every path.
    fn execute(&self, job: &TestJob) -> TestResult {
        let id = TestResult::generate_id();
        let started_at = Utc::now();
        info!("testing {} against {} {}", job.downstream, job.upstream, job.upstream_version);

        let mut env = match self.provider.acquire() {
            Ok(env) => env,
            Err(e) => {
                warn!("provisioning failed for {}: {e:#}", job.downstream);
                return error_result(
                    job,
                    &id,
                    started_at,
                    format!("failed to provision environment: {e:#}"),
                    BTreeMap::new(),
                );
            },
        };
        let env_meta = env.describe();

        if let Some(diagnostic) =
            install_stage(env.as_mut(), &job.upstream, Some(&job.upstream_version))
        {
            return error_result(job, &id, started_at, diagnostic, env_meta);
        }

        let constraint = (!job.constraint.is_empty()).then_some(job.constraint.as_str());
        if let Some(diagnostic) = install_stage(env.as_mut(), &job.downstream, constraint) {
            return error_result(job, &id, started_at, diagnostic, env_meta);
        }

        // Best-effort; "unknown" is an acceptable answer
        let downstream_version =
            env.installed_version(&job.downstream).unwrap_or_else(|| "unknown".to_string());

        let run = match env.run(&job.test_command, job.timeout) {
            Ok(run) => run,
            Err(e) => {
                return error_result(
                    job,
                    &id,
                    started_at,
                    format!("failed to execute test command: {e:#}"),
                    env_meta,
                );
            },
        };
        let finished_at = Utc::now();

        let (status, output) = if run.timed_out {
            let diagnostic = format!(
                "test command timed out after {}s\n{}",
                job.timeout.as_secs(),
                run.output
            );
            (TestStatus::Error, diagnostic)
        } else if run.exit_code == Some(0) {
            (TestStatus::Pass, run.output)
        } else {
            (TestStatus::Fail, run.output)
        };

        TestResult {
            id,
            upstream_package: job.upstream.clone(),
            upstream_version: job.upstream_version.clone(),
            downstream_package: job.downstream.clone(),
            downstream_version,
            test_command: job.test_command.clone(),
            status,
            started_at,
            finished_at,
            output,
            exit_code: run.exit_code,
            environment: env_meta,
        }
    }
}

/// Run one install stage, returning the diagnostic on failure
fn install_stage(
    env: &mut dyn Environment,
    package: &str,
    version: Option<&str>,
) -> Option<String> {
    match env.install(package, version) {
        Ok(outcome) if outcome.success => None,
        Ok(outcome) => {
            let pin = version.map(|v| format!(" {v}")).unwrap_or_default();
            Some(format!("failed to install {package}{pin}: {}", outcome.output))
        },
        Err(e) => Some(format!("failed to install {package}: {e:#}")),
    }
}

fn error_result(
    job: &TestJob,
    id: &str,
    started_at: DateTime<Utc>,
    diagnostic: String,
    environment: BTreeMap<String, String>,
) -> TestResult {
    TestResult {
        id: id.to_string(),
        upstream_package: job.upstream.clone(),
        upstream_version: job.upstream_version.clone(),
        downstream_package: job.downstream.clone(),
        downstream_version: "unknown".to_string(),
        test_command: job.test_command.clone(),
        status: TestStatus::Error,
        started_at,
        finished_at: Utc::now(),
        output: diagnostic,
        exit_code: None,
        environment,
    }
}
