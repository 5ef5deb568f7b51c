//! Platform abstraction layer
//!
//! Detects whether the launcher runs inside a sandbox and provides the
//! bridge used to start processes on the host side of that boundary.

mod bridge;
mod sandbox;
mod traits;

pub use bridge::{FlatpakBridge, NativeBridge};
pub use sandbox::{SandboxKind, FLATPAK_ID_VAR, FLATPAK_INFO_PATH};
pub use traits::*;

use crate::config::BridgeConfig;
use std::sync::Arc;

/// Platform implementation factory
pub struct Platform;

impl Platform {
    /// Detect the sandbox once and build the matching host bridge
    pub fn host_bridge(config: &BridgeConfig) -> Arc<dyn HostBridge> {
        let kind = SandboxKind::detect();
        info!(
            "Sandbox detection: {:?} (sandboxed: {})",
            kind,
            kind.is_sandboxed()
        );
        kind.bridge(config)
    }
}
