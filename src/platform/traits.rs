//! Platform-specific operation traits
//!
//! The host spawn bridge is the only capability the dispatcher needs from
//! the platform. It is shared process-wide and holds no mutable state.

use crate::error::Result;
use std::path::Path;
use std::time::Duration;

/// A process started on the host and left running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProcess {
    /// OS process id of the spawned helper, when known
    pub pid: Option<u32>,
    /// Program that was requested (before any bridge prefix)
    pub command: String,
}

/// Starts processes in the host environment, from inside or outside a sandbox
#[async_trait::async_trait]
pub trait HostBridge: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Rewrite `argv` so that executing the result runs `argv` on the host
    fn host_argv(&self, argv: &[String]) -> Vec<String>;

    /// Start `argv` on the host without waiting for it
    async fn spawn_on_host(&self, argv: &[String], cwd: &Path) -> Result<HostProcess>;

    /// Run `argv` on the host to completion, returning its exit code.
    /// Output is discarded; exceeding `timeout` is an error.
    async fn run_on_host(&self, argv: &[String], timeout: Duration) -> Result<i32>;
}
