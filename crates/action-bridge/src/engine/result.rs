//! Outcome types shared by the execution engine and its callers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why a command did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(alias = "ACTION_NOT_FOUND")]
    NotFound,
    #[serde(alias = "MISSING_CONTEXT")]
    MissingContext,
    #[serde(alias = "ACTION_DISABLED")]
    Disabled,
    #[serde(alias = "PROJECT_REQUIRED")]
    ProjectRequired,
    #[serde(alias = "EDITOR_REQUIRED")]
    EditorRequired,
    #[serde(alias = "FILE_REQUIRED")]
    FileRequired,
    #[serde(alias = "GIT_REPOSITORY_REQUIRED")]
    RepositoryRequired,
    #[serde(alias = "BUILD_SYSTEM_REQUIRED")]
    BuildSystemRequired,
    #[serde(alias = "UNKNOWN_ERROR")]
    Unknown,
}

/// Result of a single command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub command_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Remediation hint intended for a human operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Context kinds the command was missing (e.g. "Editor").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_context: Option<Vec<String>>,
}

impl ExecutionResult {
    pub fn triggered(id: impl Into<String>) -> Self {
        Self {
            command_id: id.into(),
            success: true,
            message: Some("Command triggered successfully".to_string()),
            error: None,
            error_kind: None,
            suggestion: None,
            required_context: None,
        }
    }

    pub fn failure(
        id: impl Into<String>,
        kind: ErrorKind,
        error: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            command_id: id.into(),
            success: false,
            message: None,
            error: Some(error.into()),
            error_kind: Some(kind),
            suggestion: Some(suggestion.into()),
            required_context: None,
        }
    }

    pub fn not_found(id: &str) -> Self {
        let prefix: String = id.chars().take(5).collect();
        Self::failure(
            id,
            ErrorKind::NotFound,
            format!("Command not found: {}", id),
            format!(
                "List available commands with /list or search with /search?q={}",
                prefix
            ),
        )
    }

    pub fn with_required_context(mut self, required: Vec<String>) -> Self {
        self.required_context = Some(required);
        self
    }
}

/// Pause between two chained commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainDelay {
    /// Derive the pause from the timing classification of each pair.
    #[default]
    Smart,
    Fixed(Duration),
}

impl ChainDelay {
    /// Negative values select smart delay.
    pub fn from_millis(ms: i64) -> Self {
        u64::try_from(ms)
            .map(|ms| ChainDelay::Fixed(Duration::from_millis(ms)))
            .unwrap_or(ChainDelay::Smart)
    }
}

/// What a chain does when one of its commands fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainPolicy {
    #[default]
    StopOnFailure,
    /// Keep going; every id is attempted.
    Force,
}

impl ChainPolicy {
    pub fn from_force(force: bool) -> Self {
        if force {
            ChainPolicy::Force
        } else {
            ChainPolicy::StopOnFailure
        }
    }

    pub fn is_force(self) -> bool {
        self == ChainPolicy::Force
    }
}
