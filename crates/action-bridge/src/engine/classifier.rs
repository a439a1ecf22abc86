//! Timing classification of command ids.
//!
//! Commands are sorted into coarse [`TimingCategory`] buckets by an ordered
//! rule table (first match wins). The category drives the "smart delay"
//! inserted between chained commands: a lower-bound estimate of how long the
//! host UI needs to settle before the next command can observe its effects.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DELAY_NONE_MS: u64 = 0;
pub const DELAY_QUICK_UI_MS: u64 = 50;
pub const DELAY_TOOL_WINDOW_MS: u64 = 100;
pub const DELAY_TREE_LIST_MS: u64 = 150;
pub const DELAY_ASYNC_OPERATION_MS: u64 = 500;

const INSTANT_COMMANDS: &[&str] = &[
    // File operations
    "SaveAll", "SaveDocument", "SaveAs", "ExportToFile",
    // Clipboard
    "$Copy", "$Paste", "$Cut", "CopyPaths", "CopyReference",
    "CopyAbsolutePath", "CopyFileName", "CopyPathFromRepositoryRootProvider",
    // Navigation without UI updates
    "GotoDeclaration", "GotoImplementation", "GotoSuperMethod",
    "GotoTypeDeclaration", "ShowUsages", "FindUsages",
    // Caret movement
    "EditorLeft", "EditorRight", "EditorUp", "EditorDown",
    "EditorLineStart", "EditorLineEnd", "EditorPageUp", "EditorPageDown",
    "EditorTextStart", "EditorTextEnd", "EditorNextWord", "EditorPreviousWord",
    // Tabs
    "NextTab", "PreviousTab", "CloseContent", "CloseActiveTab",
    // Bookmarks
    "ToggleBookmark", "ShowBookmarks", "GotoNextBookmark", "GotoPreviousBookmark",
    // Folding
    "CollapseRegion", "ExpandRegion", "CollapseAllRegions", "ExpandAllRegions",
];

const QUICK_UI_COMMANDS: &[&str] = &[
    "ReformatCode", "OptimizeImports", "RearrangeCode", "AutoIndentLines",
    "CommentByLineComment", "CommentByBlockComment",
    "EditorToggleShowWhitespaces", "EditorToggleShowLineNumbers",
    "EditorToggleUseSoftWraps", "EditorToggleShowIndentLines",
    "ViewNavigationBar", "ViewStatusBar", "ViewToolBar",
    "EditorSelectWord", "EditorUnSelectWord", "$SelectAll",
];

const TOOL_WINDOW_COMMANDS: &[&str] = &[
    "ActivateProjectToolWindow", "ActivateStructureToolWindow",
    "ActivateFavoritesToolWindow", "ActivateVersionControlToolWindow",
    "ActivateTerminalToolWindow", "ActivateDebugToolWindow",
    "ActivateRunToolWindow", "ActivateTODOToolWindow",
    "ActivateProblemsViewToolWindow", "ActivateFindToolWindow",
    "ActivateServicesToolWindow", "ActivateBuildToolWindow",
    "MaximizeToolWindow", "HideActiveWindow", "HideAllWindows",
    "JumpToLastWindow", "StretchWindowToLeft", "StretchWindowToRight",
];

const TREE_LIST_COMMANDS: &[&str] = &[
    "Tree-selectFirst", "Tree-selectLast", "Tree-selectNext", "Tree-selectPrevious",
    "Tree-selectParent", "Tree-selectChild",
    "List-selectFirstRow", "List-selectLastRow", "List-selectNextRow", "List-selectPreviousRow",
    "$Delete",
];

const ASYNC_TRIGGER_COMMANDS: &[&str] = &[
    // Build
    "CompileDirty", "CompileProject", "BuildProject", "RebuildProject",
    "MakeModule", "Compile", "GenerateSources",
    // Run/debug
    "Run", "Debug", "RunClass", "DebugClass", "RunConfiguration",
    "ChooseRunConfiguration", "ChooseDebugConfiguration",
    // Network VCS
    "Git.Pull", "Git.Push", "Git.Fetch", "Git.Merge", "Git.Rebase",
    "Svn.Update", "Svn.Commit", "Hg.Pull", "Hg.Push",
    // Indexing and refresh
    "Synchronize", "Refresh", "RefreshLinkedCppProjects",
    "Maven.Reimport", "Gradle.RefreshDependencies",
    "ExternalSystem.RefreshAllProjects", "ExternalSystem.ProjectRefreshAction",
];

const DIALOG_COMMANDS: &[&str] = &[
    "ShowSettings", "ShowProjectStructureSettings", "EditRunConfigurations",
    "CheckinProject", "Git.Branches", "Vcs.ShowHistoryForBlock",
    "Vcs.ShowTabbedFileHistory", "Vcs.ShowHistoryForRevision",
    "RefactoringMenu", "RenameElement", "Move", "ExtractMethod",
    "ExtractInterface", "ExtractSuperclass", "Inline", "ChangeSignature",
    "SearchEverywhere", "FindInPath", "ReplaceInPath", "StructuralSearchPlugin",
    "About", "NewElement", "NewProject", "OpenFile", "OpenProject",
    "PrintExportToHTML", "ExportSettings", "ImportSettings",
];

const EDITOR_PREFIX: &str = "Editor";
const LONG_RUNNING_KEYWORDS: &[&str] =
    &["Build", "Compile", "Make", "Refresh", "Synchronize", "Index"];

/// How long the host UI needs after a command before the next one runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimingCategory {
    /// No observable UI state to settle.
    Instant,
    /// Immediate editor/UI feedback.
    QuickUi,
    /// Tool window activation animations.
    ToolWindow,
    /// Tree/list selection updates.
    TreeList,
    /// Starts background work (build, run, VCS network, indexing).
    #[serde(rename = "async")]
    AsyncTrigger,
    /// Opens a modal surface; always invoked asynchronously.
    Dialog,
    Unknown,
}

impl TimingCategory {
    /// Settle delay associated with the category.
    pub fn delay_ms(self) -> u64 {
        match self {
            TimingCategory::Instant => DELAY_NONE_MS,
            TimingCategory::QuickUi => DELAY_QUICK_UI_MS,
            TimingCategory::ToolWindow => DELAY_TOOL_WINDOW_MS,
            TimingCategory::TreeList => DELAY_TREE_LIST_MS,
            TimingCategory::AsyncTrigger => DELAY_ASYNC_OPERATION_MS,
            TimingCategory::Dialog => DELAY_NONE_MS,
            TimingCategory::Unknown => DELAY_QUICK_UI_MS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimingCategory::Instant => "instant",
            TimingCategory::QuickUi => "quick-ui",
            TimingCategory::ToolWindow => "tool-window",
            TimingCategory::TreeList => "tree-list",
            TimingCategory::AsyncTrigger => "async",
            TimingCategory::Dialog => "dialog",
            TimingCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TimingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the classification table.
#[derive(Clone, Copy)]
pub struct ClassificationRule {
    pub category: TimingCategory,
    /// Short label used in debug logs.
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
}

impl fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("category", &self.category)
            .field("name", &self.name)
            .finish()
    }
}

fn is_dialog_heuristic(id: &str) -> bool {
    (id.contains("Show") && id.contains("Settings"))
        || (id.contains("Show") && id.contains("Dialog"))
        || id.contains("Refactor")
        || id.ends_with("InPath")
}

fn is_plain_editor_command(id: &str) -> bool {
    id.starts_with(EDITOR_PREFIX)
        && !id.contains("Split")
        && !id.contains("Toggle")
        && !QUICK_UI_COMMANDS.contains(&id)
}

fn is_tool_window_activation(id: &str) -> bool {
    id.starts_with("Activate") && id.ends_with("ToolWindow")
}

fn is_tree_or_list_command(id: &str) -> bool {
    id.starts_with("Tree-") || id.starts_with("List-")
}

fn is_run_or_debug(id: &str) -> bool {
    (id.contains("Run") || id.contains("Debug")) && !id.contains("Configuration")
}

fn is_long_running(id: &str) -> bool {
    LONG_RUNNING_KEYWORDS.iter().any(|keyword| id.contains(keyword))
}

/// Classification rules in precedence order.
///
/// Fixed-set membership for a category is listed before that category's
/// heuristics; categories appear in the order dialog, instant, quick-ui,
/// tool-window, tree-list, async.
pub fn standard_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule {
            category: TimingCategory::Dialog,
            name: "dialog-set",
            matches: |id| DIALOG_COMMANDS.contains(&id),
        },
        ClassificationRule {
            category: TimingCategory::Dialog,
            name: "dialog-heuristic",
            matches: is_dialog_heuristic,
        },
        ClassificationRule {
            category: TimingCategory::Instant,
            name: "instant-set",
            matches: |id| INSTANT_COMMANDS.contains(&id),
        },
        ClassificationRule {
            category: TimingCategory::Instant,
            name: "editor-prefix",
            matches: is_plain_editor_command,
        },
        ClassificationRule {
            category: TimingCategory::QuickUi,
            name: "quick-ui-set",
            matches: |id| QUICK_UI_COMMANDS.contains(&id),
        },
        ClassificationRule {
            category: TimingCategory::ToolWindow,
            name: "tool-window-set",
            matches: |id| TOOL_WINDOW_COMMANDS.contains(&id),
        },
        ClassificationRule {
            category: TimingCategory::ToolWindow,
            name: "activate-tool-window",
            matches: is_tool_window_activation,
        },
        ClassificationRule {
            category: TimingCategory::TreeList,
            name: "tree-list-set",
            matches: |id| TREE_LIST_COMMANDS.contains(&id),
        },
        ClassificationRule {
            category: TimingCategory::TreeList,
            name: "tree-list-prefix",
            matches: is_tree_or_list_command,
        },
        ClassificationRule {
            category: TimingCategory::AsyncTrigger,
            name: "async-set",
            matches: |id| ASYNC_TRIGGER_COMMANDS.contains(&id),
        },
        ClassificationRule {
            category: TimingCategory::AsyncTrigger,
            name: "run-debug",
            matches: is_run_or_debug,
        },
        ClassificationRule {
            category: TimingCategory::AsyncTrigger,
            name: "long-running",
            matches: is_long_running,
        },
    ]
}

/// Maps command ids to timing categories and inter-command delays.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    rules: Vec<ClassificationRule>,
}

impl Default for CommandClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandClassifier {
    /// Create a classifier with the standard rule table.
    pub fn new() -> Self {
        Self {
            rules: standard_rules(),
        }
    }

    /// Add a rule that takes precedence over every existing rule.
    pub fn with_override(mut self, rule: ClassificationRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Classify a command id. Unmatched ids are [`TimingCategory::Unknown`].
    pub fn classify(&self, id: &str) -> TimingCategory {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(id))
            .map(|rule| rule.category)
            .unwrap_or(TimingCategory::Unknown)
    }

    pub fn is_instant(&self, id: &str) -> bool {
        self.classify(id) == TimingCategory::Instant
    }

    pub fn is_dialog(&self, id: &str) -> bool {
        self.classify(id) == TimingCategory::Dialog
    }

    /// Smart delay in milliseconds to wait after `current` before `next`.
    pub fn smart_delay_ms(&self, current: &str, next: Option<&str>) -> u64 {
        let Some(next) = next else {
            return DELAY_NONE_MS;
        };

        let current_category = self.classify(current);
        if current_category == TimingCategory::Dialog {
            return DELAY_NONE_MS;
        }

        if current_category == TimingCategory::Instant && self.is_instant(next) {
            debug!(current, next, "No delay between instant commands");
            return DELAY_NONE_MS;
        }

        if current_category == TimingCategory::AsyncTrigger {
            debug!(current, "Async operation delay");
            return DELAY_ASYNC_OPERATION_MS;
        }

        // Unknown already maps to the quick-ui delay.
        let delay = current_category.delay_ms();
        debug!(current, category = %current_category, delay_ms = delay, "Category delay");
        delay
    }

    /// [`smart_delay_ms`](Self::smart_delay_ms) as a `Duration`.
    pub fn smart_delay(&self, current: &str, next: Option<&str>) -> Duration {
        Duration::from_millis(self.smart_delay_ms(current, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_classifications() {
        let classifier = CommandClassifier::new();

        assert_eq!(classifier.classify("SaveAll"), TimingCategory::Instant);
        assert_eq!(classifier.classify("CompileProject"), TimingCategory::AsyncTrigger);
        assert_eq!(classifier.smart_delay_ms("CompileProject", Some("SaveAll")), 500);
        assert_eq!(classifier.classify("RenameElement"), TimingCategory::Dialog);
        assert_eq!(classifier.smart_delay_ms("RenameElement", Some("SaveAll")), 0);
        assert_eq!(
            classifier.classify("ActivateTerminalToolWindow"),
            TimingCategory::ToolWindow
        );
        assert_eq!(
            classifier.smart_delay_ms("ActivateTerminalToolWindow", Some("SaveAll")),
            100
        );
    }

    #[test]
    fn test_dialog_commands_never_wait() {
        let classifier = CommandClassifier::new();
        for id in DIALOG_COMMANDS {
            assert_eq!(classifier.classify(id), TimingCategory::Dialog, "{}", id);
            assert_eq!(classifier.smart_delay_ms(id, Some("CompileProject")), 0);
            assert_eq!(classifier.smart_delay_ms(id, Some("Tree-selectNext")), 0);
        }
    }

    #[test]
    fn test_last_command_never_waits() {
        let classifier = CommandClassifier::new();
        for id in ["SaveAll", "CompileProject", "Tree-selectNext", "Whatever", "ReformatCode"] {
            assert_eq!(classifier.smart_delay_ms(id, None), 0);
        }
    }

    #[test]
    fn test_instant_pairs_never_wait() {
        let classifier = CommandClassifier::new();
        for current in INSTANT_COMMANDS {
            for next in ["SaveAll", "EditorLineEnd", "GotoDeclaration"] {
                assert_eq!(classifier.smart_delay_ms(current, Some(next)), 0);
            }
        }
    }

    #[test]
    fn test_instant_before_quick_ui_uses_instant_delay() {
        let classifier = CommandClassifier::new();
        assert_eq!(classifier.classify("ReformatCode"), TimingCategory::QuickUi);
        assert_eq!(classifier.smart_delay_ms("SaveAll", Some("ReformatCode")), 0);
        assert_eq!(classifier.smart_delay_ms("ReformatCode", Some("SaveAll")), 50);
    }

    #[test]
    fn test_unknown_defaults_to_quick_ui_delay() {
        let classifier = CommandClassifier::new();
        assert_eq!(classifier.classify("TotallyCustomAction"), TimingCategory::Unknown);
        assert_eq!(
            classifier.smart_delay_ms("TotallyCustomAction", Some("SaveAll")),
            DELAY_QUICK_UI_MS
        );
    }

    #[test]
    fn test_heuristics() {
        let classifier = CommandClassifier::new();
        assert_eq!(classifier.classify("ShowColorSettings"), TimingCategory::Dialog);
        assert_eq!(classifier.classify("Refactorings.QuickList"), TimingCategory::Dialog);
        assert_eq!(classifier.classify("EditorCloneCaretBelow"), TimingCategory::Instant);
        assert_eq!(
            classifier.classify("EditorToggleShowWhitespaces"),
            TimingCategory::QuickUi
        );
        assert_eq!(classifier.classify("EditorSplitLine"), TimingCategory::Unknown);
        assert_eq!(classifier.classify("ActivateRunToolWindow"), TimingCategory::ToolWindow);
        assert_eq!(classifier.classify("Tree-expand"), TimingCategory::TreeList);
        assert_eq!(classifier.smart_delay_ms("Tree-expand", Some("SaveAll")), 150);
        assert_eq!(classifier.classify("RunTests"), TimingCategory::AsyncTrigger);
        assert_eq!(
            classifier.classify("ManageConfigurationDebug"),
            TimingCategory::Unknown
        );
        assert_eq!(classifier.classify("InvalidateIndexCaches"), TimingCategory::AsyncTrigger);
    }

    #[test]
    fn test_override_rule_takes_precedence() {
        let classifier = CommandClassifier::new().with_override(ClassificationRule {
            category: TimingCategory::Instant,
            name: "custom",
            matches: |id| id == "CompileProject",
        });
        assert_eq!(classifier.classify("CompileProject"), TimingCategory::Instant);
        assert_eq!(classifier.rules().len(), standard_rules().len() + 1);
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&TimingCategory::AsyncTrigger).unwrap();
        assert_eq!(json, "\"async\"");
        let json = serde_json::to_string(&TimingCategory::QuickUi).unwrap();
        assert_eq!(json, "\"quick-ui\"");
        assert_eq!(TimingCategory::TreeList.to_string(), "tree-list");
    }
}
