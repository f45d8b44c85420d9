//! Notification sink port

use crate::core::models::{TestResult, VersionChange};

/// Receiver for completed test batches
///
/// Fire-and-forget from the core's perspective: implementations must not
/// fail in a way that affects recorded results. Delivery problems are
/// theirs to log and swallow.
pub trait Notifier: Send + Sync {
    /// Hand off the completed batch for a detected version change
    fn notify(&self, change: &VersionChange, results: &[TestResult]);
}
