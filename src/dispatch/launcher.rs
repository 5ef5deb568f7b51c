//! Host terminal launching
//!
//! Starts a resolved terminal program on the host, outside the sandbox,
//! with the script running inside a login-style shell. Launches are
//! fire-and-forget: nothing is tracked once the terminal is up.

use std::path::PathBuf;
use std::sync::Arc;

use super::probe::TerminalProbe;
use crate::config::ShellConfig;
use crate::error::{Error, Result};
use crate::models::TerminalCandidate;
use crate::platform::HostBridge;

/// Launches host terminals through the spawn bridge
pub struct HostLauncher {
    bridge: Arc<dyn HostBridge>,
    shell: ShellConfig,
    working_directory: PathBuf,
}

impl HostLauncher {
    pub fn new(
        bridge: Arc<dyn HostBridge>,
        shell: ShellConfig,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bridge,
            shell,
            working_directory: working_directory.into(),
        }
    }

    /// Host argv: `<program> <separator> <shell argv...> <script>`
    pub fn command_for(&self, candidate: &TerminalCandidate, script: &str) -> Vec<String> {
        let mut argv = vec![candidate.program.clone()];
        if !candidate.exec_separator.is_empty() {
            argv.push(candidate.exec_separator.clone());
        }
        argv.extend(self.shell.argv(script));
        argv
    }

    /// Launch `script` in `candidate`; `false` on any spawn failure
    pub async fn launch(&self, candidate: &TerminalCandidate, script: &str) -> bool {
        let argv = self.command_for(candidate, script);
        match self
            .bridge
            .spawn_on_host(&argv, &self.working_directory)
            .await
        {
            Ok(process) => {
                info!(
                    "Launched {} on host via {} (pid: {:?})",
                    process.command,
                    self.bridge.name(),
                    process.pid
                );
                true
            }
            Err(e) => {
                warn!("Failed to launch {}: {}", candidate.program, e);
                false
            }
        }
    }

    /// Probe then launch each candidate once, in order
    ///
    /// Returns the candidate that both resolved and launched, or
    /// [`Error::ProbeExhausted`] naming every candidate tried.
    pub async fn launch_first_available<'a>(
        &self,
        probe: &TerminalProbe,
        candidates: &'a [TerminalCandidate],
        script: &str,
    ) -> Result<&'a TerminalCandidate> {
        for candidate in candidates {
            if !probe.is_available(candidate).await {
                continue;
            }
            if self.launch(candidate, script).await {
                return Ok(candidate);
            }
        }
        Err(Error::ProbeExhausted {
            tried: candidates
                .iter()
                .map(|c| c.program.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}
