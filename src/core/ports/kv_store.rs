//! Key-value store port
//!
//! The graph, ledger, and watcher all persist through this narrow
//! interface: string keys, serialized-record string values. The backing
//! medium (per-key files, memory, a relational table) is an adapter
//! concern.

use thiserror::Error;

/// Failures raised by storage backends
///
/// Storage failures are infrastructure failures: callers must propagate
/// them rather than fold them into per-job outcomes, since an unrecorded
/// result is a correctness gap.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be decoded
    #[error("corrupt record for key {key}: {source}")]
    Corrupt {
        /// Key whose value failed to decode
        key: String,
        /// Decode failure
        source: serde_json::Error,
    },

    /// Key contains characters the backend cannot represent
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Write refused because the key already exists
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// A lock guarding the store was poisoned by a panicking writer
    #[error("store lock poisoned")]
    Poisoned,
}

/// String-keyed store of serialized records
///
/// Keys are unique; iteration order is unspecified. Concurrent operations
/// on distinct keys never conflict.
pub trait KvStore: Send + Sync {
    /// Read the value for a key, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any existing value for the key
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key; removing an absent key is a no-op
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Enumerate all keys currently present
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Whether a key is present
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}
