//! PyPI version source
//!
//! Fetches the latest published version of a package from the PyPI JSON
//! API. Only compiled with the `http` feature.

use anyhow::Context as _;
use log::debug;

use crate::core::ports::VersionSource;

const DEFAULT_BASE_URL: &str = "https://pypi.org";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Version source backed by the PyPI JSON API
#[derive(Debug, Clone)]
pub struct PyPiVersionSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl PyPiVersionSource {
    /// Source pointed at pypi.org
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Source pointed at a custom registry root (mirrors, test servers)
    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl VersionSource for PyPiVersionSource {
    fn latest_version(&self, package: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/pypi/{package}/json", self.base_url);
        debug!("fetching {url}");

        let response =
            self.client.get(&url).send().with_context(|| format!("request to {url} failed"))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: serde_json::Value = response
            .error_for_status()
            .with_context(|| format!("registry rejected request for {package}"))?
            .json()
            .context("malformed registry response")?;

        Ok(body
            .get("info")
            .and_then(|info| info.get("version"))
            .and_then(serde_json::Value::as_str)
            .map(String::from))
    }
}
