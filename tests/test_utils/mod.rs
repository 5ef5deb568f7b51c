//! Test Utilities and Mocks
//!
//! Shared by the contract, integration and property test targets.

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_pty;

// Re-exports for convenience
pub use fixtures::{dispatcher_with, test_config, RecordingSink};
pub use mock_bridge::MockBridge;
pub use mock_pty::MockPtyBackend;
