//! Common test utilities shared across test types
//!
//! - `mocks.rs` - scripted port implementations and test data helpers

pub mod mocks;

/// Route `log` output through env_logger so `RUST_LOG=debug` surfaces
/// service logging during test runs. Safe to call from every test; only
/// the first call installs the logger.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
