//! Explains why a command is disabled in the current context.
//!
//! The host only reports "disabled"; the reason is inferred from the command
//! id and the context snapshot using an ordered rule table. The first rule
//! whose id pattern applies decides the outcome.

use crate::host::ContextSnapshot;

use super::result::ErrorKind;

/// Inferred reason for a disabled command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub kind: ErrorKind,
    pub suggestion: String,
    /// Context kinds the command is missing.
    pub required_context: Vec<String>,
}

struct DisabledRule {
    applies: fn(&str) -> bool,
    /// Whether the context lacks what the rule's commands need. Rules whose
    /// requirement cannot be observed report it as always missing.
    missing: fn(&ContextSnapshot) -> bool,
    kind: ErrorKind,
    requirement: &'static str,
    suggestion: &'static str,
}

fn contains_any(id: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| id.contains(needle))
}

fn always(_: &ContextSnapshot) -> bool {
    true
}

const RULES: &[DisabledRule] = &[
    DisabledRule {
        applies: |id| contains_any(id, &["Reformat", "Optimize", "Comment"]) || id.starts_with("Editor"),
        missing: |ctx| !ctx.has_editor,
        kind: ErrorKind::EditorRequired,
        requirement: "Editor",
        suggestion: "Open a file in the editor first, then try again.",
    },
    DisabledRule {
        applies: |id| contains_any(id, &["Copy", "Move", "Delete", "Rename"]),
        missing: |ctx| !ctx.has_file && !ctx.has_file_selection,
        kind: ErrorKind::FileRequired,
        requirement: "File selection",
        suggestion: "Select a file in the Project view or open one in the editor.",
    },
    DisabledRule {
        applies: |id| {
            id.starts_with("Git.")
                || id.starts_with("Vcs.")
                || contains_any(id, &["Commit", "Push", "Pull"])
        },
        missing: always,
        kind: ErrorKind::RepositoryRequired,
        requirement: "Git repository",
        suggestion: "Command requires a Git repository. Ensure your project is under version control.",
    },
    DisabledRule {
        applies: |id| contains_any(id, &["Build", "Compile", "Make", "Run", "Debug"]),
        missing: always,
        kind: ErrorKind::BuildSystemRequired,
        requirement: "Build configuration",
        suggestion: "Configure your build system (Maven/Gradle) or run configuration first.",
    },
    DisabledRule {
        applies: |id| id.starts_with("Tree-") || id.starts_with("List-"),
        missing: always,
        kind: ErrorKind::MissingContext,
        requirement: "Tree/List focus",
        suggestion: "Focus on a tree or list component first (e.g., Project view, Structure view).",
    },
];

/// Infer why `id` is disabled under `context`.
pub fn diagnose_disabled(id: &str, context: &ContextSnapshot) -> Diagnosis {
    if !context.has_project {
        return Diagnosis {
            kind: ErrorKind::ProjectRequired,
            suggestion: "No project is open. Open a project in the IDE first.".to_string(),
            required_context: vec!["Project".to_string()],
        };
    }

    // Only the first rule whose id pattern applies is consulted. When its
    // requirement is present the generic diagnosis is used.
    let rule = RULES
        .iter()
        .find(|rule| (rule.applies)(id))
        .filter(|rule| (rule.missing)(context));

    match rule {
        Some(rule) => Diagnosis {
            kind: rule.kind,
            suggestion: rule.suggestion.to_string(),
            required_context: vec![rule.requirement.to_string()],
        },
        None => Diagnosis {
            kind: ErrorKind::MissingContext,
            suggestion: format!(
                "Command '{}' requires specific context. Try: 1) Open a file, \
                 2) Select items in Project view, 3) Focus on the appropriate tool window.",
                id
            ),
            required_context: vec!["Appropriate context".to_string()],
        },
    }
}
