//! Python virtualenv environment provider
//!
//! Each acquired environment is a fresh temporary directory holding its
//! own virtualenv. Upstream and downstream packages install through the
//! venv's `pip`; the test command runs through `sh -c` with the venv's
//! `bin` directory first on `PATH`. Dropping the environment deletes the
//! directory, so release is guaranteed on every exit path.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::Context as _;
use log::debug;
use tempfile::TempDir;

use crate::adapters::command::{DEFAULT_KILL_GRACE, combine_output, run_with_timeout};
use crate::core::ports::{Environment, EnvironmentProvider, InstallOutcome, RunOutcome};

/// Provisions one virtualenv per acquired environment
#[derive(Debug, Clone)]
pub struct VenvEnvironmentProvider {
    python: String,
    kill_grace: Duration,
}

impl Default for VenvEnvironmentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl VenvEnvironmentProvider {
    /// Provider using `python3` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            python: "python3".to_string(),
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    /// Use a specific Python interpreter
    #[must_use]
    pub fn with_python(mut self, python: &str) -> Self {
        self.python = python.to_string();
        self
    }

    /// Grace period between SIGTERM and SIGKILL at test timeout
    #[must_use]
    pub const fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }
}

impl EnvironmentProvider for VenvEnvironmentProvider {
    fn acquire(&self) -> anyhow::Result<Box<dyn Environment>> {
        let dir = TempDir::new().context("failed to create environment directory")?;
        let venv = dir.path().join("venv");

        debug!("creating venv at {}", venv.display());
        let created = Command::new(&self.python)
            .args(["-m", "venv"])
            .arg(&venv)
            .output()
            .with_context(|| format!("failed to invoke {}", self.python))?;
        if !created.status.success() {
            anyhow::bail!(
                "venv creation failed: {}",
                String::from_utf8_lossy(&created.stderr)
            );
        }

        Ok(Box::new(VenvEnvironment {
            dir,
            venv,
            python: self.python.clone(),
            kill_grace: self.kill_grace,
        }))
    }
}

/// One live virtualenv; the backing directory is removed on drop
struct VenvEnvironment {
    dir: TempDir,
    venv: PathBuf,
    python: String,
    kill_grace: Duration,
}

impl VenvEnvironment {
    fn pip(&self) -> PathBuf {
        self.venv.join("bin").join("pip")
    }
}

impl Environment for VenvEnvironment {
    fn install(&mut self, package: &str, version: Option<&str>) -> anyhow::Result<InstallOutcome> {
        let spec = version.map_or_else(|| package.to_string(), |v| pin_spec(package, v));
        debug!("pip install {spec}");

        let output = Command::new(self.pip())
            .args(["install", &spec])
            .current_dir(self.dir.path())
            .output()
            .context("failed to invoke pip")?;

        Ok(InstallOutcome {
            success: output.status.success(),
            output: combine_output(
                &String::from_utf8_lossy(&output.stdout),
                &String::from_utf8_lossy(&output.stderr),
            ),
        })
    }

    fn installed_version(&mut self, package: &str) -> Option<String> {
        let output = Command::new(self.pip()).args(["show", package]).output().ok()?;
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.lines()
            .find_map(|line| line.strip_prefix("Version:"))
            .map(|v| v.trim().to_string())
    }

    fn run(&mut self, command: &str, timeout: Duration) -> anyhow::Result<RunOutcome> {
        let bin = self.venv.join("bin");
        let path = match std::env::var("PATH") {
            Ok(existing) => format!("{}:{existing}", bin.display()),
            Err(_) => bin.display().to_string(),
        };

        let mut cmd = Command::new("sh");
        cmd.args(["-c", command])
            .current_dir(self.dir.path())
            .env("PATH", path)
            .env("VIRTUAL_ENV", &self.venv);
        run_with_timeout(&mut cmd, timeout, self.kill_grace)
    }

    fn describe(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("provider".to_string(), "venv".to_string()),
            ("python".to_string(), self.python.clone()),
        ])
    }
}

/// A bare version pins exactly; anything starting with an operator is
/// passed through as-is (the constraint stays opaque)
fn pin_spec(package: &str, version: &str) -> String {
    if version.starts_with(['=', '<', '>', '!', '~']) {
        format!("{package}{version}")
    } else {
        format!("{package}=={version}")
    }
}
