//! Version record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last-seen version state for one watched package
///
/// Updated only after a successful fetch from the version source; a failed
/// fetch leaves the prior record untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Watched package name
    pub package: String,

    /// Most recent version observed at the source
    pub last_seen_version: String,

    /// When the source was last successfully consulted
    pub checked_at: DateTime<Utc>,
}

impl VersionRecord {
    /// Create a record observed now
    #[must_use]
    pub fn new(package: &str, version: &str) -> Self {
        Self {
            package: package.to_string(),
            last_seen_version: version.to_string(),
            checked_at: Utc::now(),
        }
    }
}

/// A detected version delta for a watched package
///
/// `old` is `None` the first time a package is observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    /// Watched package name
    pub package: String,
    /// Previously stored version, if any
    pub old: Option<String>,
    /// Newly observed version
    pub new: String,
}
