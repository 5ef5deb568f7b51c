//! Host spawn bridges
//!
//! `FlatpakBridge` reaches the host through `flatpak-spawn --host`;
//! `NativeBridge` is used when the launcher already runs on the host.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::traits::{HostBridge, HostProcess};
use crate::error::{Error, Result};

/// Bridge for launchers running inside a flatpak sandbox
#[derive(Debug, Clone)]
pub struct FlatpakBridge {
    spawn_path: PathBuf,
}

impl FlatpakBridge {
    /// Create a bridge using the given `flatpak-spawn` binary
    pub fn new(spawn_path: impl Into<PathBuf>) -> Self {
        Self {
            spawn_path: spawn_path.into(),
        }
    }

    /// Path of the spawn helper
    pub fn spawn_path(&self) -> &Path {
        &self.spawn_path
    }
}

#[async_trait::async_trait]
impl HostBridge for FlatpakBridge {
    fn name(&self) -> &str {
        "flatpak-spawn"
    }

    fn host_argv(&self, argv: &[String]) -> Vec<String> {
        let mut host = Vec::with_capacity(argv.len() + 2);
        host.push(self.spawn_path.to_string_lossy().into_owned());
        host.push("--host".to_string());
        host.extend(argv.iter().cloned());
        host
    }

    async fn spawn_on_host(&self, argv: &[String], cwd: &Path) -> Result<HostProcess> {
        spawn_detached(&self.host_argv(argv), argv, cwd, Some(&self.spawn_path))
    }

    async fn run_on_host(&self, argv: &[String], timeout: Duration) -> Result<i32> {
        run_with_timeout(&self.host_argv(argv), argv, timeout, Some(&self.spawn_path)).await
    }
}

/// Bridge for launchers that already run on the host
#[derive(Debug, Clone, Default)]
pub struct NativeBridge;

impl NativeBridge {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl HostBridge for NativeBridge {
    fn name(&self) -> &str {
        "native"
    }

    fn host_argv(&self, argv: &[String]) -> Vec<String> {
        argv.to_vec()
    }

    async fn spawn_on_host(&self, argv: &[String], cwd: &Path) -> Result<HostProcess> {
        spawn_detached(argv, argv, cwd, None)
    }

    async fn run_on_host(&self, argv: &[String], timeout: Duration) -> Result<i32> {
        run_with_timeout(argv, argv, timeout, None).await
    }
}

fn requested_program(requested: &[String]) -> String {
    requested.first().cloned().unwrap_or_default()
}

/// Map a spawn failure to its first-order cause
fn spawn_error(err: io::Error, requested: &[String], bridge: Option<&Path>) -> Error {
    match bridge {
        Some(path) if err.kind() == io::ErrorKind::NotFound => Error::BridgeUnavailable {
            program: path.display().to_string(),
            reason: err.to_string(),
        },
        _ => Error::LaunchFailed {
            command: requested_program(requested),
            reason: err.to_string(),
        },
    }
}

fn build_command(argv: &[String], requested: &[String]) -> Result<Command> {
    let (program, args) = argv.split_first().ok_or_else(|| Error::LaunchFailed {
        command: requested_program(requested),
        reason: "empty command line".to_string(),
    })?;

    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    Ok(command)
}

fn spawn_detached(
    argv: &[String],
    requested: &[String],
    cwd: &Path,
    bridge: Option<&Path>,
) -> Result<HostProcess> {
    let mut command = build_command(argv, requested)?;
    command.current_dir(cwd);

    // The child handle is dropped on purpose: the terminal outlives us
    let child = command
        .spawn()
        .map_err(|e| spawn_error(e, requested, bridge))?;

    Ok(HostProcess {
        pid: child.id(),
        command: requested_program(requested),
    })
}

async fn run_with_timeout(
    argv: &[String],
    requested: &[String],
    timeout: Duration,
    bridge: Option<&Path>,
) -> Result<i32> {
    let mut command = build_command(argv, requested)?;
    command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .map_err(|e| spawn_error(e, requested, bridge))?;

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => Ok(status.code().unwrap_or(-1)),
        Ok(Err(e)) => Err(Error::ProcessWaitFailed {
            reason: e.to_string(),
        }),
        Err(_) => Err(Error::ProbeTimeout {
            program: requested.join(" "),
            timeout,
        }),
    }
}
