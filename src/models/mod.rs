//! Core data models
//!
//! Actions, execution requests and results, and the host terminal
//! candidate list.

pub mod action;
pub mod execution;
pub mod terminal;

// Re-exports for convenience
pub use action::{Action, ExecutionRequest};
pub use execution::{ExecutionResult, ExecutionTier, MonitorState, NO_SCRIPT};
pub use terminal::{TerminalCandidate, DEFAULT_TERMINALS};
