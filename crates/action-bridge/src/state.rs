//! Application state for the action bridge server.
//!
//! This is the composition root: every long-lived service is created here
//! once and handed to handlers through Axum's state.

use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::engine::{
    CommandClassifier, ConditionalExecutor, ExecutionEngine, StateEvaluator, UiDispatcher,
};
use crate::error::AppResult;
use crate::history::HistoryStore;
use crate::host::{CommandRegistry, UiContext};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Host command registry
    pub registry: Arc<dyn CommandRegistry>,

    pub classifier: Arc<CommandClassifier>,
    pub history: Arc<HistoryStore>,
    pub engine: Arc<ExecutionEngine>,
    pub evaluator: Arc<StateEvaluator>,
    pub conditional: Arc<ConditionalExecutor>,

    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Wire the services together and start the UI dispatch thread.
    pub fn new(
        config: AppConfig,
        registry: Arc<dyn CommandRegistry>,
        context: Arc<dyn UiContext>,
        history: Arc<HistoryStore>,
    ) -> AppResult<Self> {
        let dispatcher = Arc::new(UiDispatcher::spawn()?);
        let classifier = Arc::new(CommandClassifier::new());

        let engine = Arc::new(ExecutionEngine::new(
            Arc::clone(&registry),
            Arc::clone(&context),
            Arc::clone(&dispatcher),
            Arc::clone(&classifier),
            Arc::clone(&history),
        ));
        let evaluator = Arc::new(StateEvaluator::new(
            context,
            Arc::clone(&registry),
            dispatcher,
        ));
        let conditional = Arc::new(ConditionalExecutor::new(
            Arc::clone(&engine),
            Arc::clone(&evaluator),
        ));

        Ok(Self {
            config: Arc::new(config),
            registry,
            classifier,
            history,
            engine,
            evaluator,
            conditional,
            start_time: Instant::now(),
        })
    }

    /// Build state for a host object implementing both collaborator traits.
    pub fn for_host<H>(config: AppConfig, host: Arc<H>, history: Arc<HistoryStore>) -> AppResult<Self>
    where
        H: CommandRegistry + UiContext + 'static,
    {
        let registry: Arc<dyn CommandRegistry> = host.clone();
        let context: Arc<dyn UiContext> = host;
        Self::new(config, registry, context, history)
    }

    /// Get the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
