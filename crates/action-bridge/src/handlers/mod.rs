//! HTTP handlers for the action bridge API.
//!
//! Engine calls block (they wait on the UI dispatch thread and sleep
//! between chained commands), so every handler that reaches the engine
//! goes through [`run_blocking`].

pub mod commands;
pub mod execute;
pub mod health;
pub mod history;
pub mod state;

use axum::extract::FromRequestParts;

use crate::error::{AppError, AppResult};

pub use commands::{check, explain, list, search};
pub use execute::{execute, execute_conditional};
pub use health::health_check;
pub use history::{clear_history, history, stats, suggestions};
pub use state::{can_execute, query_state, tool_windows};

/// Largest number of ids returned by listing endpoints.
pub const MAX_LISTED_COMMANDS: usize = 100;

/// Query string extractor whose rejection is a JSON `400`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Run a blocking engine call on tokio's blocking pool.
pub(crate) async fn run_blocking<F, T>(f: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}

/// Require a non-blank query parameter.
pub(crate) fn required<'a>(value: &'a Option<String>, name: &str) -> AppResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{}' parameter", name)))
}
