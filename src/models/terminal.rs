//! Terminal Candidates
//!
//! The ranked list of host terminal emulators the launcher knows how to drive.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known host terminal programs, highest preference first
pub static DEFAULT_TERMINALS: Lazy<Vec<TerminalCandidate>> = Lazy::new(|| {
    vec![
        TerminalCandidate::new("ptyxis", "--"),
        TerminalCandidate::new("konsole", "-e"),
        TerminalCandidate::new("gnome-terminal", "--"),
        TerminalCandidate::new("xterm", "-e"),
    ]
});

/// A terminal emulator that can be asked to run a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalCandidate {
    /// Program name, resolved on the host `PATH`
    pub program: String,
    /// Argument that precedes the command the terminal should run
    #[serde(default = "default_separator")]
    pub exec_separator: String,
}

fn default_separator() -> String {
    "--".to_string()
}

impl TerminalCandidate {
    /// Create a candidate
    pub fn new(program: impl Into<String>, exec_separator: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            exec_separator: exec_separator.into(),
        }
    }

    /// Look up a built-in candidate by program name, falling back to `--`
    pub fn named(program: &str) -> Self {
        DEFAULT_TERMINALS
            .iter()
            .find(|candidate| candidate.program == program)
            .cloned()
            .unwrap_or_else(|| Self::new(program, default_separator()))
    }

    /// Parse a comma-separated list of program names
    pub fn parse_list(list: &str) -> Vec<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Self::named)
            .collect()
    }
}

impl fmt::Display for TerminalCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)
    }
}
