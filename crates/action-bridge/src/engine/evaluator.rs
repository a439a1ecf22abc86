//! State predicate evaluation.
//!
//! A predicate is a short string such as `editor`, `!hasErrors`,
//! `fileType:Kotlin` or `Git.Pull:enabled`. It is resolved against the live
//! host context on the UI dispatch thread. Resolution order is exact
//! keywords, then `name:arg` prefixes, then `arg:name` suffixes, so a suffix
//! form never shadows a keyword.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::host::{CommandRegistry, ToolWindowState, UiContext};

use super::dispatch::UiDispatcher;

const PROJECT_TOOL_WINDOW: &str = "Project";
const TERMINAL_TOOL_WINDOW: &str = "Terminal";

/// Host handles a predicate is resolved against.
struct Probe<'a> {
    context: &'a dyn UiContext,
    registry: &'a dyn CommandRegistry,
}

impl Probe<'_> {
    fn focus_is(&self, tool_window: &str) -> bool {
        self.context.focused_tool_window().as_deref() == Some(tool_window)
    }

    fn command_enabled(&self, id: &str) -> bool {
        self.registry.exists(id) && self.registry.is_enabled(id, &self.context.snapshot())
    }
}

type Keyword = (&'static [&'static str], fn(&Probe) -> bool);
type Parameterized = fn(&Probe, &str) -> bool;

const KEYWORDS: &[Keyword] = &[
    (&["editor", "hasEditor"], |p| p.context.has_open_editor()),
    (&["file", "hasFile"], |p| p.context.has_open_file()),
    (&["project", "hasProject"], |p| p.context.has_project()),
    (&["projectView"], |p| p.context.is_tool_window_visible(PROJECT_TOOL_WINDOW)),
    (&["terminal"], |p| p.context.is_tool_window_visible(TERMINAL_TOOL_WINDOW)),
    (&["hasModifications", "hasUnsavedChanges"], |p| p.context.has_unsaved_changes()),
    (&["hasErrors"], |p| p.context.has_errors()),
    (&["hasSelection"], |p| p.context.has_selection()),
    (&["isIndexing", "indexing"], |p| p.context.is_indexing()),
    (&["focusInEditor", "editorHasFocus"], |p| p.context.is_editor_focused()),
    (&["focusInProject"], |p| p.focus_is(PROJECT_TOOL_WINDOW)),
    (&["focusInTerminal"], |p| p.focus_is(TERMINAL_TOOL_WINDOW)),
    (&["focusInToolWindow"], |p| p.context.focused_tool_window().is_some()),
    (&["hasFocus", "ideFocused"], |p| p.context.is_ide_focused()),
    (&["gitRepository", "hasGit"], |p| p.context.has_vcs()),
];

const PREFIXES: &[(&str, Parameterized)] = &[
    ("fileType:", |p, wanted| {
        let type_matches = p
            .context
            .current_file_type()
            .is_some_and(|t| t.eq_ignore_ascii_case(wanted));
        type_matches
            || p
                .context
                .current_file_extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
    }),
    ("hasExtension:", |p, wanted| {
        p.context
            .current_file_extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
    }),
    ("focusInToolWindow:", |p, id| p.focus_is(id)),
    ("focusInFile:", |p, name| {
        p.context.is_editor_focused() && p.context.current_file_name().as_deref() == Some(name)
    }),
];

const SUFFIXES: &[(&[&str], Parameterized)] = &[
    (&[":enabled"], |p, id| p.command_enabled(id)),
    (&[":window", ":toolWindow"], |p, id| p.context.is_tool_window_visible(id)),
    (&[":active"], |p, id| p.context.is_tool_window_active(id)),
];

/// Split a predicate into its negation flag and the bare predicate.
pub fn strip_negation(predicate: &str) -> (bool, &str) {
    if let Some(rest) = predicate.strip_prefix('!') {
        (true, rest)
    } else if let Some(rest) = predicate.strip_prefix("not:") {
        (true, rest)
    } else {
        (false, predicate)
    }
}

/// Resolve a bare (non-negated) predicate. `None` means unrecognised.
fn resolve(probe: &Probe, predicate: &str) -> Option<bool> {
    if let Some((_, check)) = KEYWORDS.iter().find(|(names, _)| names.contains(&predicate)) {
        return Some(check(probe));
    }

    for (prefix, check) in PREFIXES {
        if let Some(argument) = predicate.strip_prefix(*prefix) {
            return Some(check(probe, argument));
        }
    }

    for (suffixes, check) in SUFFIXES {
        if let Some(argument) = suffixes.iter().find_map(|s| predicate.strip_suffix(*s)) {
            return Some(check(probe, argument));
        }
    }

    None
}

/// Evaluates state predicates against the live host context.
pub struct StateEvaluator {
    context: Arc<dyn UiContext>,
    registry: Arc<dyn CommandRegistry>,
    dispatcher: Arc<UiDispatcher>,
}

impl StateEvaluator {
    pub fn new(
        context: Arc<dyn UiContext>,
        registry: Arc<dyn CommandRegistry>,
        dispatcher: Arc<UiDispatcher>,
    ) -> Self {
        Self {
            context,
            registry,
            dispatcher,
        }
    }

    /// Evaluate one predicate, honouring a leading `!` or `not:`.
    ///
    /// Unknown predicates evaluate to `false` before negation is applied.
    pub fn evaluate(&self, predicate: &str) -> bool {
        let (negated, bare) = strip_negation(predicate);

        let context = Arc::clone(&self.context);
        let registry = Arc::clone(&self.registry);
        let owned = bare.to_string();
        let resolved = self.dispatcher.invoke_and_wait(move || {
            let probe = Probe {
                context: context.as_ref(),
                registry: registry.as_ref(),
            };
            resolve(&probe, &owned)
        });

        let value = match resolved {
            Ok(Some(value)) => value,
            Ok(None) => {
                warn!(predicate = %bare, "Unknown state predicate");
                false
            }
            Err(e) => {
                warn!(predicate = %bare, error = %e, "State predicate could not be resolved");
                return false;
            }
        };

        let result = value != negated;
        debug!(predicate, result, "Evaluated state predicate");
        result
    }

    /// Evaluate each predicate independently. Nothing is cached between
    /// entries, so repeated predicates may observe different live state.
    pub fn evaluate_all<S: AsRef<str>>(&self, predicates: &[S]) -> BTreeMap<String, bool> {
        predicates
            .iter()
            .map(|p| (p.as_ref().to_string(), self.evaluate(p.as_ref())))
            .collect()
    }

    /// Every tool window with its visibility flags.
    pub fn tool_windows(&self) -> BTreeMap<String, ToolWindowState> {
        let context = Arc::clone(&self.context);
        self.dispatcher
            .invoke_and_wait(move || context.tool_windows())
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read tool windows");
                BTreeMap::new()
            })
    }

    /// Whether each command exists and is enabled right now.
    pub fn can_execute<S: AsRef<str>>(&self, ids: &[S]) -> BTreeMap<String, bool> {
        ids.iter()
            .map(|id| {
                let id = id.as_ref();
                (id.to_string(), self.evaluate(&format!("{}:enabled", id)))
            })
            .collect()
    }
}
