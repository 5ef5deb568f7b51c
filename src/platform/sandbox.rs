//! Sandbox detection

use std::env;
use std::path::Path;
use std::sync::Arc;

use super::bridge::{FlatpakBridge, NativeBridge};
use super::traits::HostBridge;
use crate::config::BridgeConfig;

/// File present at the root of every flatpak sandbox
pub const FLATPAK_INFO_PATH: &str = "/.flatpak-info";

/// Environment variable set by flatpak for sandboxed apps
pub const FLATPAK_ID_VAR: &str = "FLATPAK_ID";

/// The environment the launcher itself runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxKind {
    /// Unrestricted host
    Host,
    /// Flatpak sandbox; host processes go through `flatpak-spawn --host`
    Flatpak,
}

impl SandboxKind {
    /// Detect from the current process environment
    pub fn detect() -> Self {
        Self::from_signals(
            env::var_os(FLATPAK_ID_VAR).is_some(),
            Path::new(FLATPAK_INFO_PATH).exists(),
        )
    }

    /// Decide from explicit signals
    pub fn from_signals(has_flatpak_id: bool, has_flatpak_info: bool) -> Self {
        if has_flatpak_id || has_flatpak_info {
            SandboxKind::Flatpak
        } else {
            SandboxKind::Host
        }
    }

    pub fn is_sandboxed(&self) -> bool {
        !matches!(self, SandboxKind::Host)
    }

    /// Bridge appropriate for this environment
    pub fn bridge(&self, config: &BridgeConfig) -> Arc<dyn HostBridge> {
        match self {
            SandboxKind::Host => Arc::new(NativeBridge::new()),
            SandboxKind::Flatpak => Arc::new(FlatpakBridge::new(&config.flatpak_spawn_path)),
        }
    }
}
