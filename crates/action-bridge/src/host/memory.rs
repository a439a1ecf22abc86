//! In-memory host.
//!
//! Backs the server binary when no IDE is attached (scripting against a
//! profile) and serves as the collaborator double in tests. State lives
//! behind locks so a running server can be reconfigured between requests.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{CommandRegistry, ContextSnapshot, HostError, ToolWindowState, UiContext};
use crate::error::{AppError, AppResult};

/// Number of invocations remembered by [`InMemoryHost::invocations`].
pub const INVOCATION_LOG_CAPACITY: usize = 1000;

/// Context a command needs before the host enables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Project,
    Editor,
    File,
}

/// Declaration of a single command in a host profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    pub id: String,

    /// Hard enable switch, applied before `requires`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub requires: Vec<Requirement>,

    /// Invocation fails with this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_with: Option<String>,

    /// Invocation panics with this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panic_with: Option<String>,
}

fn default_true() -> bool {
    true
}

impl CommandSpec {
    /// An always-enabled command that succeeds.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            requires: Vec::new(),
            fail_with: None,
            panic_with: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requires.push(requirement);
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    pub fn panicking(mut self, message: impl Into<String>) -> Self {
        self.panic_with = Some(message.into());
        self
    }

    fn satisfied_by(&self, context: &ContextSnapshot) -> bool {
        self.requires.iter().all(|requirement| match requirement {
            Requirement::Project => context.has_project,
            Requirement::Editor => context.has_editor,
            Requirement::File => context.has_file || context.has_file_selection,
        })
    }
}

/// File currently shown in the selected editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl OpenFile {
    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string)
    }
}

/// Mutable UI state of the in-memory host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostState {
    pub project: bool,
    pub editor: bool,
    pub file: Option<OpenFile>,
    pub file_selection: bool,
    pub unsaved_changes: bool,
    pub errors: bool,
    pub selection: bool,
    pub indexing: bool,
    pub editor_focused: bool,
    pub ide_focused: bool,
    pub vcs: bool,
    pub focused_tool_window: Option<String>,
    pub tool_windows: BTreeMap<String, ToolWindowState>,
}

/// YAML document describing commands and the initial UI state.
///
/// ```yaml
/// commands:
///   - id: SaveAll
///   - id: ReformatCode
///     requires: [editor]
///   - id: Git.Pull
///     fail_with: "remote rejected"
/// context:
///   project: true
///   editor: true
///   file: { name: Main.kt, file_type: Kotlin }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostProfile {
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
    #[serde(default)]
    pub context: HostState,
}

/// Registry and UI context held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    commands: RwLock<BTreeMap<String, CommandSpec>>,
    state: RwLock<HostState>,
    invocations: Mutex<VecDeque<String>>,
}

impl InMemoryHost {
    /// Create a host with no commands and no open project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host from a parsed profile.
    pub fn from_profile(profile: HostProfile) -> Self {
        let host = Self::new();
        for spec in profile.commands {
            host.register(spec);
        }
        host.set_state(profile.context);
        host
    }

    /// Parse a YAML host profile.
    pub fn from_yaml(yaml: &str) -> AppResult<Self> {
        let profile: HostProfile = serde_yaml::from_str(yaml)
            .map_err(|e| AppError::Config(format!("Invalid host profile: {}", e)))?;
        Ok(Self::from_profile(profile))
    }

    /// Load a YAML host profile from disk.
    pub fn load(path: &Path) -> AppResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        let host = Self::from_yaml(&yaml)?;
        info!(
            path = %path.display(),
            commands = host.command_count(),
            "Loaded host profile"
        );
        Ok(host)
    }

    /// Register (or replace) a command.
    pub fn register(&self, spec: CommandSpec) {
        debug!(command = %spec.id, "Registering command");
        self.commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(spec.id.clone(), spec);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_command(self, spec: CommandSpec) -> Self {
        self.register(spec);
        self
    }

    /// Register plain succeeding commands.
    pub fn with_commands<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.register(CommandSpec::new(id));
        }
        self
    }

    pub fn command_count(&self) -> usize {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Replace the whole UI state.
    pub fn set_state(&self, state: HostState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Mutate the UI state in place.
    pub fn update_state<F: FnOnce(&mut HostState)>(&self, update: F) {
        update(&mut self.state.write().unwrap_or_else(PoisonError::into_inner));
    }

    /// Builder-style [`update_state`](Self::update_state).
    pub fn with_state<F: FnOnce(&mut HostState)>(self, update: F) -> Self {
        self.update_state(update);
        self
    }

    /// Ids of the most recently invoked commands, oldest first.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn read_state<T>(&self, f: impl FnOnce(&HostState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Like `read_state` but yields `T::default()` without an open project.
    fn project_state<T: Default>(&self, f: impl FnOnce(&HostState) -> T) -> T {
        self.read_state(|state| if state.project { f(state) } else { T::default() })
    }

    fn spec(&self, id: &str) -> Option<CommandSpec> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

impl CommandRegistry for InMemoryHost {
    fn exists(&self, id: &str) -> bool {
        self.spec(id).is_some()
    }

    fn is_enabled(&self, id: &str, context: &ContextSnapshot) -> bool {
        self.spec(id)
            .map(|spec| spec.enabled && spec.satisfied_by(context))
            .unwrap_or(false)
    }

    fn invoke(&self, id: &str, _context: &ContextSnapshot) -> Result<(), HostError> {
        let spec = self
            .spec(id)
            .ok_or_else(|| HostError::Failed(format!("Command not registered: {}", id)))?;

        {
            let mut log = self.invocations.lock().unwrap_or_else(PoisonError::into_inner);
            if log.len() == INVOCATION_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(id.to_string());
        }

        if let Some(message) = spec.panic_with {
            panic!("{}", message);
        }
        match spec.fail_with {
            Some(message) => Err(HostError::Failed(message)),
            None => Ok(()),
        }
    }

    fn list_ids(&self) -> Vec<String> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl UiContext for InMemoryHost {
    fn has_project(&self) -> bool {
        self.read_state(|s| s.project)
    }

    fn has_open_editor(&self) -> bool {
        self.project_state(|s| s.editor)
    }

    fn has_open_file(&self) -> bool {
        self.project_state(|s| s.file.is_some())
    }

    fn has_unsaved_changes(&self) -> bool {
        self.read_state(|s| s.unsaved_changes)
    }

    fn has_errors(&self) -> bool {
        self.project_state(|s| s.errors)
    }

    fn has_selection(&self) -> bool {
        self.project_state(|s| s.editor && s.selection)
    }

    fn is_indexing(&self) -> bool {
        self.project_state(|s| s.indexing)
    }

    fn is_editor_focused(&self) -> bool {
        self.project_state(|s| s.editor && s.editor_focused)
    }

    fn is_ide_focused(&self) -> bool {
        self.project_state(|s| s.ide_focused)
    }

    fn has_vcs(&self) -> bool {
        self.project_state(|s| s.vcs)
    }

    fn focused_tool_window(&self) -> Option<String> {
        self.project_state(|s| s.focused_tool_window.clone())
    }

    fn is_tool_window_visible(&self, id: &str) -> bool {
        self.project_state(|s| s.tool_windows.get(id).is_some_and(|w| w.visible))
    }

    fn is_tool_window_active(&self, id: &str) -> bool {
        self.project_state(|s| s.tool_windows.get(id).is_some_and(|w| w.active))
    }

    fn tool_windows(&self) -> BTreeMap<String, ToolWindowState> {
        self.project_state(|s| s.tool_windows.clone())
    }

    fn current_file_name(&self) -> Option<String> {
        self.project_state(|s| s.file.as_ref().map(|f| f.name.clone()))
    }

    fn current_file_type(&self) -> Option<String> {
        self.project_state(|s| s.file.as_ref().and_then(|f| f.file_type.clone()))
    }

    fn current_file_extension(&self) -> Option<String> {
        self.project_state(|s| s.file.as_ref().and_then(OpenFile::extension))
    }

    fn snapshot(&self) -> ContextSnapshot {
        self.read_state(|s| ContextSnapshot {
            has_project: s.project,
            has_editor: s.project && s.editor,
            has_file: s.project && s.file.is_some(),
            has_file_selection: s.project && s.file_selection,
            focused_tool_window: if s.project {
                s.focused_tool_window.clone()
            } else {
                None
            },
        })
    }
}
