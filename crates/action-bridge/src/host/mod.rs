//! Host IDE collaborators.
//!
//! The bridge never talks to an IDE directly. Everything it needs from the
//! host is expressed through two traits:
//!
//! - [`CommandRegistry`]: looks up, enables and invokes command actions
//! - [`UiContext`]: answers questions about the live editor/UI state
//!
//! Implementations must be cheap to query repeatedly; the engine asks for a
//! fresh [`ContextSnapshot`] on every single invocation and never caches it.

pub mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryHost;

/// Failure raised by a host collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The command handler reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The command handler panicked on the UI dispatch thread.
    #[error("Command handler panicked: {0}")]
    Panicked(String),

    /// The UI dispatch thread is no longer accepting work.
    #[error("UI dispatch thread is not running")]
    DispatcherGone,
}

/// Point-in-time view of the data a command handler is invoked against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    /// A project is open.
    pub has_project: bool,
    /// A text editor is selected.
    pub has_editor: bool,
    /// A file is associated with the current context.
    pub has_file: bool,
    /// One or more files are selected (e.g. in the project tree).
    pub has_file_selection: bool,
    /// Id of the tool window that currently owns focus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_tool_window: Option<String>,
}

/// Visibility flags for a single tool window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolWindowState {
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Lookup and invocation of host command actions.
pub trait CommandRegistry: Send + Sync {
    /// Whether the host knows a command with this id.
    fn exists(&self, id: &str) -> bool;

    /// Refresh the command's presentation against `context` and report
    /// whether it is enabled.
    fn is_enabled(&self, id: &str, context: &ContextSnapshot) -> bool;

    /// Perform the command.
    fn invoke(&self, id: &str, context: &ContextSnapshot) -> Result<(), HostError>;

    /// Every registered command id.
    fn list_ids(&self) -> Vec<String>;
}

/// Live UI/editor state of the host.
///
/// Methods that depend on an open project are expected to return `false`
/// (or `None`) when no project is open rather than failing.
pub trait UiContext: Send + Sync {
    fn has_project(&self) -> bool;
    fn has_open_editor(&self) -> bool;
    fn has_open_file(&self) -> bool;
    fn has_unsaved_changes(&self) -> bool;
    fn has_errors(&self) -> bool;
    fn has_selection(&self) -> bool;
    fn is_indexing(&self) -> bool;
    fn is_editor_focused(&self) -> bool;
    fn is_ide_focused(&self) -> bool;
    fn has_vcs(&self) -> bool;

    /// Id of the tool window containing the focus owner, if any.
    fn focused_tool_window(&self) -> Option<String>;

    fn is_tool_window_visible(&self, id: &str) -> bool;
    fn is_tool_window_active(&self, id: &str) -> bool;

    /// Every tool window the host knows about.
    fn tool_windows(&self) -> BTreeMap<String, ToolWindowState>;

    /// File name (with extension) of the selected file.
    fn current_file_name(&self) -> Option<String>;
    /// Host file type name of the selected file (e.g. "Kotlin").
    fn current_file_type(&self) -> Option<String>;
    /// Extension of the selected file, without the dot.
    fn current_file_extension(&self) -> Option<String>;

    /// Build the data context a command would be invoked against.
    fn snapshot(&self) -> ContextSnapshot;
}
