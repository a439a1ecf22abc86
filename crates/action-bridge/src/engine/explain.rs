//! Static, id-based description of what a command needs.

use serde::Serialize;

/// Context a command is expected to need, inferred from its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequirements {
    pub needs_editor: bool,
    pub needs_file: bool,
    pub needs_project: bool,
    pub needs_git: bool,
    pub needs_build_system: bool,
}

impl CommandRequirements {
    pub fn infer(id: &str) -> Self {
        let any = |needles: &[&str]| needles.iter().any(|needle| id.contains(needle));
        Self {
            needs_editor: any(&["Reformat", "Optimize", "Comment"]) || id.starts_with("Editor"),
            needs_file: any(&["Copy", "Move", "Delete", "Rename"]),
            needs_project: id != "About" && id != "ShowSettings",
            needs_git: id.starts_with("Git.") || id.starts_with("Vcs."),
            needs_build_system: any(&["Build", "Compile", "Make", "Run"]),
        }
    }
}

const DESCRIPTIONS: &[(fn(&str) -> bool, &str)] = &[
    (|id| id == "SaveAll", "Save all modified files"),
    (|id| id == "ReformatCode", "Reformat current file according to code style"),
    (|id| id == "OptimizeImports", "Remove unused imports and organize them"),
    (|id| id.starts_with("Git."), "Git version control operation"),
    (|id| id.starts_with("Run"), "Run or execute operation"),
    (|id| id.starts_with("Debug"), "Debug operation"),
    (|id| id.contains("Copy"), "Copy operation"),
    (|id| id.contains("Paste"), "Paste operation"),
    (
        |id| id.starts_with("Activate") && id.ends_with("ToolWindow"),
        "Activate tool window",
    ),
    (|id| id.starts_with("Tree-"), "Tree navigation action"),
];

/// Human readable one-liner for a command.
pub fn describe(id: &str) -> &'static str {
    DESCRIPTIONS
        .iter()
        .find(|(matches, _)| matches(id))
        .map(|(_, description)| *description)
        .unwrap_or("IDE action")
}
