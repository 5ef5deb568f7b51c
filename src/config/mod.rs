//! Configuration for the execution dispatcher
//!
//! Holds the fixed, read-only settings the dispatcher is built from: the
//! ranked terminal candidates, probe timing, the shell invocation used for
//! scripts, embedded terminal geometry and the host spawn bridge path.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::{TerminalCandidate, DEFAULT_TERMINALS};

pub use loader::{ConfigFormat, ConfigLoader};

/// Environment variable forcing the embedded terminal (`1` or `true`)
pub const ENV_FORCE_EMBEDDED: &str = "PORTAL_LAUNCHER_FORCE_EMBEDDED";

/// Environment variable overriding the candidate list (comma separated)
pub const ENV_TERMINALS: &str = "PORTAL_LAUNCHER_TERMINALS";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host terminal probing
    pub probe: ProbeConfig,

    /// Shell used to interpret scripts
    pub shell: ShellConfig,

    /// Embedded terminal fallback
    pub embedded: EmbeddedConfig,

    /// Sandbox-to-host spawn bridge
    pub bridge: BridgeConfig,

    /// Host terminal candidates, highest preference first
    pub terminals: Vec<TerminalCandidate>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probe: ProbeConfig::default(),
            shell: ShellConfig::default(),
            embedded: EmbeddedConfig::default(),
            bridge: BridgeConfig::default(),
            terminals: DEFAULT_TERMINALS.clone(),
        }
    }
}

/// Host terminal probe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-candidate probe timeout in milliseconds
    pub timeout_ms: u64,

    /// Host command used to look a program up on `PATH`
    pub lookup_command: String,

    /// Remember probe outcomes for the lifetime of the process
    pub cache_results: bool,
}

impl ProbeConfig {
    /// Probe timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            lookup_command: "which".to_string(),
            cache_results: false,
        }
    }
}

/// Shell invocation wrapping every script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Shell executable
    pub program: String,

    /// Arguments placed before the script
    pub args: Vec<String>,
}

impl ShellConfig {
    /// Full argv running `script` in this shell
    pub fn argv(&self, script: &str) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv.push(script.to_string());
        argv
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        // Non-interactive login-style shell, independent of user rc files
        Self {
            program: "bash".to_string(),
            args: vec![
                "--noprofile".to_string(),
                "--norc".to_string(),
                "-lc".to_string(),
            ],
        }
    }
}

/// Embedded terminal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddedConfig {
    /// Skip host terminals and always use the embedded terminal
    pub force: bool,

    /// Lines of scrollback retained by the default surface
    pub scrollback_lines: usize,

    /// Follow new output
    pub scroll_on_output: bool,

    /// Terminal rows
    pub rows: u16,

    /// Terminal columns
    pub cols: u16,

    /// Working directory for scripts; the process cwd when unset
    pub working_directory: Option<PathBuf>,
}

impl EmbeddedConfig {
    /// Resolved working directory
    pub fn working_directory(&self) -> PathBuf {
        self.working_directory.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"))
        })
    }
}

impl Default for EmbeddedConfig {
    fn default() -> Self {
        Self {
            force: false,
            scrollback_lines: 10_000,
            scroll_on_output: true,
            rows: 24,
            cols: 80,
            working_directory: None,
        }
    }
}

/// Host spawn bridge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Path of the flatpak host spawn helper
    pub flatpak_spawn_path: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            flatpak_spawn_path: PathBuf::from("/usr/bin/flatpak-spawn"),
        }
    }
}
