//! Version source port

/// External registry answering "what is the latest version of this
/// package?"
///
/// Network-bound. An `Err` is a transient failure (unreachable source,
/// malformed response) and is retried on the next poll cycle; `Ok(None)`
/// means the source answered and does not know the package.
pub trait VersionSource: Send + Sync {
    /// Fetch the latest published version of a package
    fn latest_version(&self, package: &str) -> anyhow::Result<Option<String>>;
}
