//! Portal Launcher - action execution dispatcher
//!
//! Maps a user-selected action (a title plus a shell script) onto a running
//! interactive process. The dispatcher decides where the script runs: in an
//! external terminal emulator on the host, reached across a flatpak sandbox
//! boundary when needed, or in an embedded pseudoterminal when no host
//! terminal is usable.
//!
//! ## Module Organization
//!
//! - [`dispatch`] - Probe, host launch, embedded fallback and process monitoring
//! - [`platform`] - Sandbox detection and host spawn bridges
//! - [`pty`] - PTY spawning, I/O streams and output surfaces
//! - [`models`] - Actions, terminal candidates and execution results
//! - [`config`] - Dispatcher settings, loading and environment overrides
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use portal_launcher::{ChannelSink, DispatchOutcome, ExecutionDispatcher, ScrollbackFactory};
//!
//! # async fn example() -> portal_launcher::Result<()> {
//! portal_launcher::init_logging(false);
//!
//! let config = portal_launcher::load_config_or_default();
//! let (tx, mut results) = tokio::sync::mpsc::unbounded_channel();
//! let surfaces = Arc::new(ScrollbackFactory::from_config(&config.embedded));
//! let dispatcher =
//!     ExecutionDispatcher::from_environment(config, Arc::new(ChannelSink::new(tx)), surfaces)?;
//!
//! if let DispatchOutcome::Embedded(mut handle) = dispatcher.run("Hello", "echo hi").await {
//!     println!("{}", handle.wait().await);
//! }
//! # let _ = results.try_recv();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **Probes** run `which <terminal>` on the host with a bounded timeout
//! - **Host launches** are fire-and-forget and report nothing
//! - **Embedded executions** use a PTY with reader/writer threads bridged to
//!   tokio channels; exit waiting runs on a blocking worker
//! - Every embedded execution reports exactly one result

#[macro_use]
extern crate tracing;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod platform;
pub mod pty;

// Re-exports for core functionality
pub use config::{Config, ConfigLoader};
pub use dispatch::{
    ChannelSink, DispatchOutcome, DispatcherBuilder, ExecutionDispatcher, ExecutionHandle,
    HostOnlyPolicy, LogSink, ProcessMonitor, ResultSink,
};
pub use error::{Error, Result};
pub use models::{Action, ExecutionResult, ExecutionTier, MonitorState, TerminalCandidate};
pub use platform::{FlatpakBridge, HostBridge, NativeBridge, SandboxKind};
pub use pty::{OutputSurface, ScrollbackFactory, ScrollbackSurface, SurfaceFactory};

/// The current version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Environment variable enabling debug logging (`1` or `true`)
pub const ENV_DEBUG: &str = "PORTAL_LAUNCHER_DEBUG";

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence. Otherwise the level is `debug` when `debug`
/// is set or `PORTAL_LAUNCHER_DEBUG` is `1`/`true`, and `info` when not.
/// Calling this more than once is harmless.
pub fn init_logging(debug: bool) {
    let env_debug = std::env::var(ENV_DEBUG)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let log_level = if debug || env_debug { "debug" } else { "info" };

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    let installed = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .is_ok();

    if installed {
        debug!("{} v{} logging initialized", NAME, VERSION);
    }
}

/// Load the dispatcher configuration, falling back to defaults
pub fn load_config_or_default() -> Config {
    match ConfigLoader::load() {
        Ok(config) => {
            info!("Configuration loaded from {}", ConfigLoader::default_config_path().display());
            config
        }
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            let mut config = Config::default();
            ConfigLoader::apply_env_overrides(&mut config);
            config
        }
    }
}
