//! PTY Process Spawning
//!
//! Creates a pseudoterminal, starts a command on its slave side and bridges
//! the blocking master I/O to async channels using background threads.

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtyPair, PtySize};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::thread;
use tokio::sync::mpsc::unbounded_channel;

use super::streams::PtyStreams;
use crate::error::{Error, Result};

/// Process spawning configuration
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Terminal size
    pub size: PtySize,
    /// Working directory
    pub working_directory: Option<PathBuf>,
    /// Extra environment variables
    pub env_vars: Vec<(String, String)>,
}

impl SpawnConfig {
    /// Configuration with the given geometry
    pub fn with_size(rows: u16, cols: u16) -> Self {
        Self {
            size: PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            },
            ..Self::default()
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            size: PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            },
            working_directory: None,
            env_vars: vec![("TERM".to_string(), "xterm-256color".to_string())],
        }
    }
}

/// Blocks until a spawned process exits and yields its exit code
pub trait ProcessWaiter: Send {
    fn wait(self: Box<Self>) -> Result<i32>;
}

/// Waiter for a child started inside a portable-pty slave
pub struct PtyChildWaiter {
    child: Box<dyn Child + Send + Sync>,
}

impl PtyChildWaiter {
    pub fn new(child: Box<dyn Child + Send + Sync>) -> Self {
        Self { child }
    }
}

impl ProcessWaiter for PtyChildWaiter {
    fn wait(mut self: Box<Self>) -> Result<i32> {
        let status = self.child.wait().map_err(|e| Error::ProcessWaitFailed {
            reason: e.to_string(),
        })?;
        Ok(status.exit_code() as i32)
    }
}

/// A command running inside a fresh PTY
pub struct SpawnedPty {
    /// Process id of the child, when the platform reports one
    pub pid: Option<u32>,
    /// Exit waiter for the child
    pub waiter: Box<dyn ProcessWaiter>,
    /// Output/input channels
    pub streams: PtyStreams,
    /// Master side, kept for resizing
    pub master: Option<Box<dyn MasterPty + Send>>,
}

/// Something that can start a command inside a pseudoterminal
pub trait PtyBackend: Send + Sync {
    fn spawn(&self, argv: &[String], config: &SpawnConfig) -> Result<SpawnedPty>;
}

/// Backend using the operating system's native PTY
#[derive(Debug, Clone, Default)]
pub struct NativePtyBackend;

impl PtyBackend for NativePtyBackend {
    fn spawn(&self, argv: &[String], config: &SpawnConfig) -> Result<SpawnedPty> {
        spawn_pty_process(argv, config)
    }
}

/// Spawn `argv` inside a new PTY
pub fn spawn_pty_process(argv: &[String], config: &SpawnConfig) -> Result<SpawnedPty> {
    let (program, args) = argv.split_first().ok_or_else(|| Error::CommandSpawnFailed {
        command: String::new(),
        reason: "empty command line".to_string(),
    })?;

    // Get the native PTY system
    let pty_system = native_pty_system();

    let pair = pty_system
        .openpty(config.size)
        .map_err(|e| Error::PtyCreationFailed {
            command: program.clone(),
            reason: e.to_string(),
        })?;

    let mut cmd_builder = CommandBuilder::new(program);
    cmd_builder.args(args);

    for (key, value) in &config.env_vars {
        cmd_builder.env(key, value);
    }

    if let Some(dir) = &config.working_directory {
        cmd_builder.cwd(dir);
    }

    let PtyPair { master, slave } = pair;
    let child = slave
        .spawn_command(cmd_builder)
        .map_err(|e| Error::CommandSpawnFailed {
            command: program.clone(),
            reason: e.to_string(),
        })?;

    // Release our copy of the slave so the reader sees EOF once the child exits
    drop(slave);

    let pid = child.process_id();
    debug!("Spawned '{}' in PTY (pid: {:?})", program, pid);

    let streams = create_pty_streams(master.as_ref())?;

    Ok(SpawnedPty {
        pid,
        waiter: Box::new(PtyChildWaiter::new(child)),
        streams,
        master: Some(master),
    })
}

/// Create PTY streams from the master side
fn create_pty_streams(master: &(dyn MasterPty + Send)) -> Result<PtyStreams> {
    let mut master_reader = master
        .try_clone_reader()
        .map_err(|e| Error::PtyReaderCloneFailed {
            reason: e.to_string(),
        })?;
    let mut master_writer = master
        .take_writer()
        .map_err(|e| Error::PtyWriterTakeFailed {
            reason: e.to_string(),
        })?;

    // Channel: PTY output -> async consumer
    let (tx_async_out, rx_async_out) = unbounded_channel::<Vec<u8>>();
    // Channel: async producer (stdin) -> PTY writer thread
    let (tx_stdin, rx_stdin) = channel::<Vec<u8>>();

    // Reader thread: read from PTY master and forward to async channel
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut consecutive_errors = 0;
        const MAX_CONSECUTIVE_ERRORS: u32 = 5;

        loop {
            match master_reader.read(&mut buf) {
                Ok(0) => {
                    debug!("PTY read EOF - process terminated");
                    break;
                }
                Ok(n) => {
                    consecutive_errors = 0;

                    if tx_async_out.send(buf[..n].to_vec()).is_err() {
                        debug!("PTY read: receiver dropped, stopping reader thread");
                        break;
                    }
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }

                    if e.kind() == std::io::ErrorKind::WouldBlock {
                        std::thread::sleep(std::time::Duration::from_millis(10));
                        continue;
                    }

                    // Linux reports EIO on the master once the slave side is gone
                    consecutive_errors += 1;
                    debug!(
                        "PTY read error ({}): {} (attempt {}/{})",
                        e.kind(),
                        e,
                        consecutive_errors,
                        MAX_CONSECUTIVE_ERRORS
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        break;
                    }

                    std::thread::sleep(std::time::Duration::from_millis(50));
                }
            }
        }
        debug!("PTY reader thread exiting");
    });

    // Writer thread: receive stdin data and write to PTY master
    thread::spawn(move || {
        while let Ok(data) = rx_stdin.recv() {
            loop {
                match master_writer.write_all(&data) {
                    Ok(()) => {
                        if let Err(e) = master_writer.flush() {
                            debug!("PTY flush error: {}", e);
                        }
                        break;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!("PTY write error ({}): {}, stopping writer thread", e.kind(), e);
                        return;
                    }
                }
            }
        }
        debug!("PTY writer thread exiting");
    });

    Ok(PtyStreams::from_channels(rx_async_out, tx_stdin))
}
