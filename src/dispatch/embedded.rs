//! Embedded terminal fallback
//!
//! Runs the script inside an in-process pseudoterminal when no host terminal
//! could be launched. The PTY child still goes through the host bridge's argv
//! rewrite, so a sandboxed launcher runs the script on the host and only the
//! display location differs.

use std::path::Path;
use std::sync::Arc;

use portable_pty::{MasterPty, PtySize};

use crate::config::{EmbeddedConfig, ShellConfig};
use crate::error::{Error, Result};
use crate::platform::HostBridge;
use crate::pty::{
    OutputPump, OutputSurface, ProcessWaiter, PtyBackend, PtyInput, PumpHandle, SpawnConfig,
};

/// Spawns scripts inside a PTY rendered by an [`OutputSurface`]
pub struct EmbeddedTerminal {
    backend: Arc<dyn PtyBackend>,
    bridge: Arc<dyn HostBridge>,
    shell: ShellConfig,
    config: EmbeddedConfig,
}

/// A freshly spawned embedded execution
pub struct EmbeddedSpawn {
    pub pid: Option<u32>,
    /// Handed to the process monitor
    pub waiter: Box<dyn ProcessWaiter>,
    pub session: EmbeddedSession,
}

impl EmbeddedTerminal {
    pub fn new(
        backend: Arc<dyn PtyBackend>,
        bridge: Arc<dyn HostBridge>,
        shell: ShellConfig,
        config: EmbeddedConfig,
    ) -> Self {
        Self {
            backend,
            bridge,
            shell,
            config,
        }
    }

    /// Argv started inside the PTY for `script`
    pub fn command_for(&self, script: &str) -> Vec<String> {
        self.bridge.host_argv(&self.shell.argv(script))
    }

    /// Start `script` in a new PTY and pump its output into `surface`
    ///
    /// Must be called within a tokio runtime. Failures carry the first-order
    /// cause (missing bridge or shell, PTY allocation) and are never retried.
    pub fn spawn(
        &self,
        script: &str,
        working_directory: &Path,
        surface: Arc<dyn OutputSurface>,
    ) -> Result<EmbeddedSpawn> {
        let argv = self.command_for(script);

        let mut spawn_config = SpawnConfig::with_size(self.config.rows, self.config.cols);
        spawn_config.working_directory = Some(working_directory.to_path_buf());

        let spawned = self.backend.spawn(&argv, &spawn_config)?;
        let program = argv.first().map(String::as_str).unwrap_or_default();
        info!(
            "Embedded terminal started {} (pid: {:?}, {}x{})",
            program, spawned.pid, self.config.cols, self.config.rows
        );

        let (output_rx, input) = spawned.streams.split();
        let label = format!("{}[{:?}]", program, spawned.pid);
        let pump = OutputPump::start(label, output_rx, Arc::clone(&surface));

        Ok(EmbeddedSpawn {
            pid: spawned.pid,
            waiter: Box::new(InputHoldingWaiter {
                inner: spawned.waiter,
                input: input.clone(),
            }),
            session: EmbeddedSession {
                surface,
                input,
                pump,
                master: spawned.master,
            },
        })
    }
}

/// Keeps the PTY stdin sender alive until the child has exited
///
/// The writer thread owns the master writer, and dropping that writer sends
/// a newline and EOF to the slave. It may only happen once the child is gone.
struct InputHoldingWaiter {
    inner: Box<dyn ProcessWaiter>,
    input: PtyInput,
}

impl ProcessWaiter for InputHoldingWaiter {
    fn wait(self: Box<Self>) -> Result<i32> {
        let InputHoldingWaiter { inner, input } = *self;
        let status = inner.wait();
        drop(input);
        status
    }
}

/// The UI-facing side of an embedded execution
///
/// Dropping or closing the session never terminates the child and never
/// writes to its stdin.
pub struct EmbeddedSession {
    surface: Arc<dyn OutputSurface>,
    input: PtyInput,
    pump: PumpHandle,
    master: Option<Box<dyn MasterPty + Send>>,
}

impl EmbeddedSession {
    pub fn surface(&self) -> &Arc<dyn OutputSurface> {
        &self.surface
    }

    pub fn is_view_open(&self) -> bool {
        !self.pump.is_detached()
    }

    /// Forward keyboard input to the child's stdin
    pub fn send_input(&self, data: &[u8]) -> Result<()> {
        if !self.is_view_open() {
            return Err(Error::PtyInputSendFailed {
                reason: "terminal view is closed".to_string(),
            });
        }
        self.input.send(data)
    }

    /// Stop displaying output and accepting input; the process keeps running
    pub fn close_view(&mut self) {
        if self.pump.is_detached() {
            return;
        }
        self.pump.detach();
        debug!("Embedded terminal view closed");
    }

    /// Resize the pseudoterminal
    ///
    /// Fails when the backend exposed no master side to resize.
    pub fn resize(&self, rows: u16, cols: u16) -> Result<()> {
        let Some(master) = &self.master else {
            return Err(Error::PtyResizeFailed {
                reason: "no pseudoterminal master for this session".to_string(),
            });
        };
        master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::PtyResizeFailed {
                reason: e.to_string(),
            })
    }
}

impl std::fmt::Debug for EmbeddedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedSession")
            .field("view_open", &self.is_view_open())
            .field("resizable", &self.master.is_some())
            .finish()
    }
}
