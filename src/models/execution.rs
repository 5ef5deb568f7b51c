//! Execution Model
//!
//! Lifecycle state and terminal result of a single action execution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message reported when a request carries no script
pub const NO_SCRIPT: &str = "no script";

/// Where an execution's output is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionTier {
    /// External terminal emulator on the host
    Host,
    /// In-process pseudoterminal surface
    Embedded,
}

impl fmt::Display for ExecutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionTier::Host => write!(f, "host"),
            ExecutionTier::Embedded => write!(f, "embedded"),
        }
    }
}

/// Lifecycle of a monitored process
///
/// `Spawning -> Running -> Exited` or `Spawning -> LaunchFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MonitorState {
    /// Spawn requested, outcome not yet known
    #[default]
    Spawning,
    /// Process is running
    Running,
    /// Process has exited
    Exited,
    /// Process never started
    LaunchFailed,
}

impl MonitorState {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, MonitorState::Exited | MonitorState::LaunchFailed)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: MonitorState) -> bool {
        matches!(
            (self, next),
            (MonitorState::Spawning, MonitorState::Running)
                | (MonitorState::Spawning, MonitorState::LaunchFailed)
                | (MonitorState::Running, MonitorState::Exited)
        )
    }
}

/// Final outcome of one execution, delivered exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Title of the action that ran
    pub title: String,
    /// Exit code; `None` when no process was ever started
    pub exit_code: Option<i32>,
    /// Error message, if any
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A process ran and exited with `code`
    pub fn exited(title: impl Into<String>, code: i32) -> Self {
        Self {
            title: title.into(),
            exit_code: Some(code),
            error: None,
        }
    }

    /// Nothing was spawned because the script was empty
    pub fn nothing_to_run(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            exit_code: None,
            error: Some(NO_SCRIPT.to_string()),
        }
    }

    /// No process could be started
    pub fn launch_failed(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            exit_code: None,
            error: Some(reason.into()),
        }
    }

    /// The process ran but its exit status could not be collected
    pub fn wait_failed(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            exit_code: Some(-1),
            error: Some(reason.into()),
        }
    }

    /// Exit code 0
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// No process existed
    pub fn is_launch_failure(&self) -> bool {
        self.exit_code.is_none()
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.exit_code, &self.error) {
            (Some(code), None) => write!(f, "{} exited with code {}", self.title, code),
            (Some(code), Some(err)) => {
                write!(f, "{} exited with code {} ({})", self.title, code, err)
            }
            (None, Some(err)) => write!(f, "{} did not run: {}", self.title, err),
            (None, None) => write!(f, "{} did not run", self.title),
        }
    }
}
