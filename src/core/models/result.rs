//! Test result model
//!
//! A result is the durable record of one job. Once appended to the ledger
//! it is never mutated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome classification for a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Test command exited zero
    Pass,
    /// Test command ran cleanly but exited nonzero
    Fail,
    /// The pipeline failed before or during execution (provisioning,
    /// install, or timeout)
    Error,
    /// Job was filtered out before dispatch. Never emitted by the
    /// orchestrator itself.
    Skip,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Error => write!(f, "error"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for TestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            "error" => Ok(Self::Error),
            "skip" => Ok(Self::Skip),
            _ => Err(format!("Invalid status: {s}. Use: pass, fail, error, skip")),
        }
    }
}

/// The recorded outcome of testing one dependent against one upstream
/// version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// Globally unique identifier (UUID v4)
    pub id: String,

    /// Package whose release was under test
    pub upstream_package: String,

    /// The upstream version tested
    pub upstream_version: String,

    /// Dependent package that was tested
    pub downstream_package: String,

    /// Effective installed version of the dependent, or "unknown" when it
    /// could not be resolved
    pub downstream_version: String,

    /// Test command that was (or would have been) executed
    pub test_command: String,

    /// Outcome classification
    pub status: TestStatus,

    /// When the job started
    pub started_at: DateTime<Utc>,

    /// When the job finished
    pub finished_at: DateTime<Utc>,

    /// Combined stdout and stderr of the pipeline, or the failure
    /// diagnostic for `error` results
    pub output: String,

    /// Exit code of the test command, when it ran to completion
    pub exit_code: Option<i32>,

    /// Environment metadata: interpreter version, provider kind, and similar
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl TestResult {
    /// Generate a fresh globally unique result id
    #[must_use]
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Wall-clock duration of the job
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
