//! UI state endpoints.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::engine::conditional::parse_chain;
use crate::error::{AppError, AppResult};
use crate::host::ToolWindowState;
use crate::state::AppState;

use super::{Query, required, run_blocking};

#[derive(Debug, Default, Deserialize)]
pub struct StateQuery {
    /// Comma-separated predicates
    pub checks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CanExecuteQuery {
    /// Comma-separated command ids
    pub actions: Option<String>,
}

/// Evaluate state predicates.
///
/// `GET /api/intellij-actions/state/query?checks=editor,!hasErrors`
///
/// Returns a flat map from each predicate, as written, to its value.
pub async fn query_state(
    State(state): State<AppState>,
    Query(query): Query<StateQuery>,
) -> AppResult<Json<BTreeMap<String, bool>>> {
    let checks = parse_chain(required(&query.checks, "checks")?);
    if checks.is_empty() {
        return Err(AppError::BadRequest("No predicates in 'checks'".to_string()));
    }

    let evaluator = state.evaluator.clone();
    let values = run_blocking(move || evaluator.evaluate_all(&checks)).await?;
    Ok(Json(values))
}

/// Visibility of every tool window.
///
/// `GET /api/intellij-actions/state/tool-windows`
pub async fn tool_windows(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, ToolWindowState>>> {
    let evaluator = state.evaluator.clone();
    let windows = run_blocking(move || evaluator.tool_windows()).await?;
    Ok(Json(windows))
}

/// Whether each command could run right now.
///
/// `GET /api/intellij-actions/state/can-execute?actions=SaveAll,ReformatCode`
pub async fn can_execute(
    State(state): State<AppState>,
    Query(query): Query<CanExecuteQuery>,
) -> AppResult<Json<BTreeMap<String, bool>>> {
    let ids = parse_chain(required(&query.actions, "actions")?);
    if ids.is_empty() {
        return Err(AppError::BadRequest("No commands in 'actions'".to_string()));
    }

    let evaluator = state.evaluator.clone();
    let values = run_blocking(move || evaluator.can_execute(&ids)).await?;
    Ok(Json(values))
}
