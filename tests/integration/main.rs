//! Integration tests for downwind
//!
//! These tests run the full poll → diff → dispatch → record → notify
//! cycle through the public API, with scripted environments and version
//! sources standing in for pip and the package registry.

// Common test utilities
#[path = "../unit/common/mod.rs"]
#[allow(dead_code)]
mod common;
