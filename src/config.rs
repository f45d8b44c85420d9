//! Configuration management
//!
//! Persistent settings for the orchestrator, watcher, and storage
//! backends. Config lives at `~/.config/downwind/config.toml` (XDG
//! standard); every field has a default so a missing or partial file is
//! never an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::paths;

/// Top-level downwind configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend selection and location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Worker pool and timeout settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Poll loop settings
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Which key-value backend the stores use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per record under the data directory
    #[default]
    File,
    /// Ephemeral in-memory store
    Memory,
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend for the graph, ledger, and version stores
    #[serde(default)]
    pub backend: StorageBackend,
    /// Override for the data directory; platform default when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Effective data directory
    #[must_use]
    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(paths::data_dir)
    }
}

/// Worker pool and timeout settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Number of jobs that may execute concurrently
    #[serde(default = "default_pool_width")]
    pub pool_width: usize,
    /// Per-job test command timeout, in seconds
    #[serde(default = "default_test_timeout_secs")]
    pub test_timeout_secs: u64,
    /// Grace between SIGTERM and SIGKILL at timeout, in seconds
    #[serde(default = "default_kill_grace_secs")]
    pub kill_grace_secs: u64,
}

const fn default_pool_width() -> usize {
    3
}

const fn default_test_timeout_secs() -> u64 {
    600
}

const fn default_kill_grace_secs() -> u64 {
    5
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            pool_width: default_pool_width(),
            test_timeout_secs: default_test_timeout_secs(),
            kill_grace_secs: default_kill_grace_secs(),
        }
    }
}

impl OrchestratorConfig {
    /// Test timeout as a `Duration`
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_secs)
    }

    /// Kill grace as a `Duration`
    #[must_use]
    pub const fn kill_grace(&self) -> Duration {
        Duration::from_secs(self.kill_grace_secs)
    }
}

/// Poll loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Seconds between poll cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Packages to watch
    #[serde(default)]
    pub packages: Vec<String>,
}

const fn default_interval_secs() -> u64 {
    300
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            packages: Vec::new(),
        }
    }
}

impl WatcherConfig {
    /// Poll interval as a `Duration`
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Load config from the default path, or defaults if not present
    #[must_use]
    pub fn load() -> Self {
        Self::load_from(&paths::config_file())
    }

    /// Load config from a specific path, or defaults if not present or
    /// unreadable
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            fs::read_to_string(path)
                .ok()
                .and_then(|content| toml::from_str(&content).ok())
                .unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&paths::config_file())
    }

    /// Save config to a specific path, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
