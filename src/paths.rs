//! Centralized path definitions for downwind
//!
//! Single source of truth for every filesystem location the default
//! file-backed stores use.
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/downwind/          # data_dir (platform equivalent)
//! ├── graph/                        # dependency edges, one file per upstream
//! │   └── <upstream>.json
//! ├── results/                      # test results, one file per result id
//! │   └── <id>.json
//! └── versions/                     # last-seen versions, one file per package
//!     └── <package>.json
//!
//! ~/.config/downwind/
//! └── config.toml                   # user configuration
//! ```

use std::path::PathBuf;

/// Application directory name under the platform data/config roots
const APP_DIR: &str = "downwind";

/// Graph store subdirectory
const GRAPH_DIR: &str = "graph";

/// Results store subdirectory
const RESULTS_DIR: &str = "results";

/// Version-record store subdirectory
const VERSIONS_DIR: &str = "versions";

/// Config filename
const CONFIG_FILE: &str = "config.toml";

/// Root data directory for all file-backed stores
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

/// Directory holding dependency-graph files
#[must_use]
pub fn graph_dir() -> PathBuf {
    data_dir().join(GRAPH_DIR)
}

/// Directory holding result files
#[must_use]
pub fn results_dir() -> PathBuf {
    data_dir().join(RESULTS_DIR)
}

/// Directory holding version-record files
#[must_use]
pub fn versions_dir() -> PathBuf {
    data_dir().join(VERSIONS_DIR)
}

/// Global config directory
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

/// Global config file path
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}
