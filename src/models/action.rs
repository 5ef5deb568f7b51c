//! Action Model
//!
//! A named action loaded by the external action registry, and the per-click
//! execution request derived from it.

use serde::{Deserialize, Serialize};

fn default_title() -> String {
    "Action".to_string()
}

/// A user-selectable action: a title plus an optional shell script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Title shown on the action button
    #[serde(default = "default_title")]
    pub title: String,

    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,

    /// Shell script to execute (may be absent or empty)
    #[serde(default)]
    pub script: Option<String>,
}

impl Action {
    /// Create an action with a title and script
    pub fn new(title: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            script: Some(script.into()),
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build the execution request for one invocation of this action
    pub fn request(&self) -> ExecutionRequest {
        ExecutionRequest::new(&self.title, self.script.as_deref().unwrap_or(""))
    }

    /// Case-insensitive substring match over title and description.
    ///
    /// An empty (or whitespace-only) query matches nothing; the search view
    /// shows the regular tabs in that case.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }

        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|desc| desc.to_lowercase().contains(&needle))
    }
}

/// A single run request: the action title and its trimmed script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Action title, used for reporting
    pub title: String,
    /// Script with leading/trailing whitespace removed
    pub script: String,
}

impl ExecutionRequest {
    /// Create a request, trimming the script
    pub fn new(title: impl Into<String>, script: &str) -> Self {
        Self {
            title: title.into(),
            script: script.trim().to_string(),
        }
    }

    /// Whether there is nothing to run
    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}
