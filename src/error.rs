//! Error types and Result aliases for the launcher

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for launcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the launcher
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Dispatch errors ===
    /// The script was empty after trimming; nothing to run
    #[error("Nothing to run: script is empty")]
    EmptyScript,

    /// No host terminal candidate could be probed and launched
    #[error("No host terminal available (tried: {tried})")]
    ProbeExhausted {
        tried: String,
    },

    /// A host probe did not answer in time
    #[error("Probe for '{program}' timed out after {timeout:?}")]
    ProbeTimeout {
        program: String,
        timeout: Duration,
    },

    /// The host spawn bridge could not be started
    #[error("Host spawn bridge '{program}' unavailable: {reason}")]
    BridgeUnavailable {
        program: String,
        reason: String,
    },

    /// A host-side launch failed
    #[error("Failed to launch '{command}': {reason}")]
    LaunchFailed {
        command: String,
        reason: String,
    },

    // === PTY-related errors ===
    /// Failed to create PTY
    #[error("Failed to create PTY for command '{command}': {reason}")]
    PtyCreationFailed {
        command: String,
        reason: String,
    },

    /// Failed to spawn command in PTY
    #[error("Failed to spawn command '{command}': {reason}")]
    CommandSpawnFailed {
        command: String,
        reason: String,
    },

    /// Failed to clone PTY reader
    #[error("Failed to clone PTY reader: {reason}")]
    PtyReaderCloneFailed {
        reason: String,
    },

    /// Failed to take PTY writer
    #[error("Failed to take PTY writer: {reason}")]
    PtyWriterTakeFailed {
        reason: String,
    },

    /// Failed to send input to PTY
    #[error("Failed to send input to PTY: {reason}")]
    PtyInputSendFailed {
        reason: String,
    },

    /// Failed to resize the PTY
    #[error("Failed to resize PTY: {reason}")]
    PtyResizeFailed {
        reason: String,
    },

    /// Waiting on a child process failed
    #[error("Failed to wait for process: {reason}")]
    ProcessWaitFailed {
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", .path.display())]
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    // === I/O and serialization errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    /// Whether this error is recovered inside the dispatcher (fall through to
    /// the next candidate or tier) rather than surfaced to the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ProbeExhausted { .. } | Error::ProbeTimeout { .. } | Error::EmptyScript
        )
    }
}

// portable-pty reports its failures as anyhow errors
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
