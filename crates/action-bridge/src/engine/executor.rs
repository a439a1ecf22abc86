//! Command execution engine.
//!
//! Coordinates single invocations and chains by:
//! - Looking commands up in the host registry
//! - Running enablement checks and handlers on the UI dispatch thread
//! - Pacing chains with fixed or classification-derived delays
//! - Reporting every outcome to the history store

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::history::HistoryStore;
use crate::host::{CommandRegistry, HostError, UiContext};

use super::classifier::CommandClassifier;
use super::diagnosis::diagnose_disabled;
use super::dispatch::UiDispatcher;
use super::result::{ChainDelay, ChainPolicy, ErrorKind, ExecutionResult};

const DISABLED_ERROR: &str = "Command is disabled in current context";
const HANDLER_FAILED_SUGGESTION: &str =
    "Check the IDE logs for details. Restart the IDE if the problem persists.";
const DISPATCH_FAILED_SUGGESTION: &str =
    "The UI dispatch thread is unavailable. Restart the bridge.";

/// Runs commands against the host.
pub struct ExecutionEngine {
    registry: Arc<dyn CommandRegistry>,
    context: Arc<dyn UiContext>,
    dispatcher: Arc<UiDispatcher>,
    classifier: Arc<CommandClassifier>,
    history: Arc<HistoryStore>,
}

impl ExecutionEngine {
    pub fn new(
        registry: Arc<dyn CommandRegistry>,
        context: Arc<dyn UiContext>,
        dispatcher: Arc<UiDispatcher>,
        classifier: Arc<CommandClassifier>,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self {
            registry,
            context,
            dispatcher,
            classifier,
            history,
        }
    }

    pub fn registry(&self) -> &Arc<dyn CommandRegistry> {
        &self.registry
    }

    pub fn classifier(&self) -> &CommandClassifier {
        &self.classifier
    }

    /// Accept a command for asynchronous execution.
    ///
    /// Success means the command exists and was queued on the dispatch
    /// thread; the handler's own outcome is only logged.
    pub fn execute(&self, id: &str) -> ExecutionResult {
        let started = Instant::now();
        let result = self.post(id);
        self.record(&result, started, None);
        result
    }

    /// Execute a command and block until its handler returns.
    ///
    /// Dialog commands are still only posted, since their handlers may not
    /// return until the dialog closes.
    pub fn execute_and_wait(&self, id: &str) -> ExecutionResult {
        self.execute_and_wait_in_chain(id, None)
    }

    /// Execute `ids` in order, stopping at the first failure.
    pub fn execute_chain(&self, ids: &[String], delay: ChainDelay) -> Vec<ExecutionResult> {
        self.run_chain(ids, delay, ChainPolicy::StopOnFailure)
    }

    /// Execute `ids` in order under `policy`.
    ///
    /// Every command is run with [`execute_and_wait`](Self::execute_and_wait)
    /// semantics. The pause is only taken after a successful command that has
    /// a successor. Under [`ChainPolicy::StopOnFailure`] the returned list ends
    /// with the first failing result.
    pub fn run_chain(
        &self,
        ids: &[String],
        delay: ChainDelay,
        policy: ChainPolicy,
    ) -> Vec<ExecutionResult> {
        let total = ids.len();
        let mut results = Vec::with_capacity(total);

        for (index, id) in ids.iter().enumerate() {
            info!(command = %id, position = index + 1, total, "Executing chained command");

            let chained_with = (index == 0 && total > 1).then(|| ids[1..].to_vec());
            let result = self.execute_and_wait_in_chain(id, chained_with);
            let succeeded = result.success;
            results.push(result);

            if !succeeded {
                if policy == ChainPolicy::StopOnFailure {
                    warn!(command = %id, "Stopping chain at failed command");
                    break;
                }
                warn!(command = %id, "Command failed, continuing in force mode");
                continue;
            }

            let Some(next) = ids.get(index + 1) else {
                continue;
            };
            let pause = match delay {
                ChainDelay::Smart => self.classifier.smart_delay(id, Some(next)),
                ChainDelay::Fixed(pause) => pause,
            };
            if pause.is_zero() {
                debug!(command = %id, next = %next, "No delay needed");
            } else {
                debug!(command = %id, next = %next, delay_ms = pause.as_millis() as u64, "Delaying before next command");
                thread::sleep(pause);
            }
        }

        info!(
            succeeded = results.iter().filter(|r| r.success).count(),
            total,
            "Chain completed"
        );
        results
    }

    fn execute_and_wait_in_chain(
        &self,
        id: &str,
        chained_with: Option<Vec<String>>,
    ) -> ExecutionResult {
        let started = Instant::now();
        let result = if self.classifier.is_dialog(id) {
            debug!(command = %id, "Dialog command, invoking asynchronously");
            self.post(id)
        } else {
            self.invoke_blocking(id)
        };
        self.record(&result, started, chained_with);
        result
    }

    fn post(&self, id: &str) -> ExecutionResult {
        if !self.registry.exists(id) {
            warn!(command = %id, "Command not found");
            return ExecutionResult::not_found(id);
        }

        let registry = Arc::clone(&self.registry);
        let context = Arc::clone(&self.context);
        let owned = id.to_string();
        let posted = self.dispatcher.post(move || {
            let result = perform(registry.as_ref(), context.as_ref(), &owned);
            if !result.success {
                warn!(
                    command = %owned,
                    error = result.error.as_deref().unwrap_or_default(),
                    "Asynchronous command did not run"
                );
            }
        });

        match posted {
            Ok(()) => ExecutionResult::triggered(id),
            Err(e) => dispatch_failure(id, e),
        }
    }

    fn invoke_blocking(&self, id: &str) -> ExecutionResult {
        if !self.registry.exists(id) {
            warn!(command = %id, "Command not found");
            return ExecutionResult::not_found(id);
        }

        let registry = Arc::clone(&self.registry);
        let context = Arc::clone(&self.context);
        let owned = id.to_string();
        self.dispatcher
            .invoke_and_wait(move || perform(registry.as_ref(), context.as_ref(), &owned))
            .unwrap_or_else(|e| dispatch_failure(id, e))
    }

    fn record(&self, result: &ExecutionResult, started: Instant, chained_with: Option<Vec<String>>) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.history.record(
            &result.command_id,
            result.success,
            elapsed_ms,
            result.error_kind,
            chained_with,
        );
    }
}

/// Enablement check and invocation. Runs on the dispatch thread.
fn perform(registry: &dyn CommandRegistry, context: &dyn UiContext, id: &str) -> ExecutionResult {
    let snapshot = context.snapshot();

    if !registry.is_enabled(id, &snapshot) {
        let diagnosis = diagnose_disabled(id, &snapshot);
        warn!(
            command = %id,
            kind = ?diagnosis.kind,
            has_project = snapshot.has_project,
            has_editor = snapshot.has_editor,
            has_file = snapshot.has_file,
            "Command is disabled"
        );
        let result = ExecutionResult::failure(id, diagnosis.kind, DISABLED_ERROR, diagnosis.suggestion);
        return if diagnosis.required_context.is_empty() {
            result
        } else {
            result.with_required_context(diagnosis.required_context)
        };
    }

    match registry.invoke(id, &snapshot) {
        Ok(()) => {
            debug!(command = %id, "Command completed");
            ExecutionResult::triggered(id)
        }
        Err(e) => {
            error!(command = %id, error = %e, "Command handler failed");
            ExecutionResult::failure(id, ErrorKind::Unknown, e.to_string(), HANDLER_FAILED_SUGGESTION)
        }
    }
}

fn dispatch_failure(id: &str, err: HostError) -> ExecutionResult {
    let suggestion = match err {
        HostError::DispatcherGone => DISPATCH_FAILED_SUGGESTION,
        _ => HANDLER_FAILED_SUGGESTION,
    };
    error!(command = %id, error = %err, "Command execution failed");
    ExecutionResult::failure(id, ErrorKind::Unknown, err.to_string(), suggestion)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::host::memory::{CommandSpec, Requirement};
    use crate::host::InMemoryHost;
    use std::time::Duration;

    pub(crate) struct Fixture {
        pub host: Arc<InMemoryHost>,
        pub dispatcher: Arc<UiDispatcher>,
        pub history: Arc<HistoryStore>,
        pub engine: Arc<ExecutionEngine>,
    }

    impl Fixture {
        /// Wait until everything already posted to the dispatch thread ran.
        pub fn flush(&self) {
            self.dispatcher.invoke_and_wait(|| ()).unwrap();
        }
    }

    pub(crate) fn fixture(host: InMemoryHost) -> Fixture {
        let host = Arc::new(host);
        let dispatcher = Arc::new(UiDispatcher::spawn().unwrap());
        let history = Arc::new(HistoryStore::in_memory());
        let engine = Arc::new(ExecutionEngine::new(
            host.clone(),
            host.clone(),
            dispatcher.clone(),
            Arc::new(CommandClassifier::new()),
            history.clone(),
        ));
        Fixture {
            host,
            dispatcher,
            history,
            engine,
        }
    }

    pub(crate) fn standard_host() -> InMemoryHost {
        InMemoryHost::new()
            .with_commands(["SaveAll", "$Copy", "RenameElement", "CustomOne", "CustomTwo"])
            .with_command(CommandSpec::new("ReformatCode").requires(Requirement::Editor))
            .with_command(CommandSpec::new("Git.Pull").failing("remote rejected"))
            .with_command(CommandSpec::new("Explode").panicking("boom"))
            .with_state(|s| s.project = true)
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_not_found() {
        let f = fixture(standard_host());
        let result = f.engine.execute_and_wait("Nope");
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::NotFound));
        assert!(f.host.invocations().is_empty());
        assert_eq!(f.history.stats_for("Nope").unwrap().failure_count, 1);
    }

    #[test]
    fn test_execute_and_wait_success() {
        let f = fixture(standard_host());
        let result = f.engine.execute_and_wait("SaveAll");
        assert!(result.success);
        assert_eq!(f.host.invocations(), vec!["SaveAll"]);
    }

    #[test]
    fn test_disabled_command_is_diagnosed() {
        let f = fixture(standard_host());
        let result = f.engine.execute_and_wait("ReformatCode");
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::EditorRequired));
        assert_eq!(result.required_context, Some(vec!["Editor".to_string()]));
        assert!(f.host.invocations().is_empty());

        f.host.update_state(|s| s.project = false);
        let result = f.engine.execute_and_wait("ReformatCode");
        assert_eq!(result.error_kind, Some(ErrorKind::ProjectRequired));
    }

    #[test]
    fn test_handler_failure_and_panic_are_unknown() {
        let f = fixture(standard_host());
        let failed = f.engine.execute_and_wait("Git.Pull");
        assert_eq!(failed.error_kind, Some(ErrorKind::Unknown));
        assert_eq!(failed.error.as_deref(), Some("remote rejected"));

        let panicked = f.engine.execute_and_wait("Explode");
        assert_eq!(panicked.error_kind, Some(ErrorKind::Unknown));
        assert!(panicked.error.unwrap().contains("boom"));

        assert!(f.engine.execute_and_wait("SaveAll").success);
    }

    #[test]
    fn test_execute_is_fire_and_forget() {
        let f = fixture(standard_host());
        let result = f.engine.execute("Git.Pull");
        assert!(result.success);
        f.flush();
        assert_eq!(f.host.invocations(), vec!["Git.Pull"]);
        assert!(f.history.stats_for("Git.Pull").unwrap().success_count == 1);
    }

    #[test]
    fn test_dialog_command_is_posted() {
        let f = fixture(standard_host());
        let result = f.engine.execute_and_wait("RenameElement");
        assert!(result.success);
        f.flush();
        assert_eq!(f.host.invocations(), vec!["RenameElement"]);
    }

    #[test]
    fn test_chain_stops_at_first_failure() {
        let f = fixture(standard_host());
        let chain = ids(&["Git.Pull", "SaveAll", "$Copy"]);
        let results = f.engine.execute_chain(&chain, ChainDelay::Fixed(Duration::ZERO));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].command_id, "Git.Pull");
        assert_eq!(f.host.invocations(), vec!["Git.Pull"]);
    }

    #[test]
    fn test_force_chain_runs_everything() {
        let f = fixture(standard_host());
        let chain = ids(&["Git.Pull", "SaveAll", "$Copy"]);
        let results =
            f.engine
                .run_chain(&chain, ChainDelay::Fixed(Duration::ZERO), ChainPolicy::Force);
        assert_eq!(results.len(), 3);
        assert!(!results[0].success);
        assert!(results[1].success && results[2].success);
    }

    #[test]
    fn test_chain_records_head_with_tail() {
        let f = fixture(standard_host());
        let chain = ids(&["SaveAll", "$Copy"]);
        let results = f.engine.execute_chain(&chain, ChainDelay::Smart);
        assert!(results.iter().all(|r| r.success));

        let recent = f.history.recent_history(10);
        assert_eq!(recent[0].command_id, "$Copy");
        assert_eq!(recent[0].chained_with, None);
        assert_eq!(recent[1].command_id, "SaveAll");
        assert_eq!(recent[1].chained_with, Some(ids(&["$Copy"])));
    }

    #[test]
    fn test_fixed_delay_is_applied_between_successes() {
        let f = fixture(standard_host());
        let chain = ids(&["CustomOne", "CustomTwo"]);
        let started = Instant::now();
        f.engine
            .execute_chain(&chain, ChainDelay::Fixed(Duration::from_millis(60)));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_smart_delay_waits_after_async_trigger() {
        let f = fixture(
            InMemoryHost::new()
                .with_commands(["CompileProject", "SaveAll"])
                .with_state(|s| s.project = true),
        );
        let started = Instant::now();
        let results = f
            .engine
            .execute_chain(&ids(&["CompileProject", "SaveAll"]), ChainDelay::Smart);
        assert!(results.iter().all(|r| r.success));
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn test_smart_delay_skips_wait_after_instant_head() {
        let f = fixture(standard_host().with_state(|s| s.editor = true));
        let started = Instant::now();
        let results = f
            .engine
            .execute_chain(&ids(&["SaveAll", "ReformatCode"]), ChainDelay::Smart);
        assert!(results.iter().all(|r| r.success));
        assert!(started.elapsed() < Duration::from_millis(250));
    }
}
