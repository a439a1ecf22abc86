//! Execution endpoints: single commands, chains and conditionals.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::conditional::{parse_chain, parse_if_then_else, parse_or_chains};
use crate::engine::{ChainDelay, ChainPolicy, Condition, ConditionalResult, ExecutionResult};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::{run_blocking, Query};

/// Parameters of `/execute`.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteQuery {
    /// Single command, executed fire-and-forget
    pub action: Option<String>,
    /// Comma-separated chain
    pub actions: Option<String>,
    /// Milliseconds between chained commands, `-1` for smart delay
    pub delay: Option<String>,
}

/// Parameters of `/execute/conditional`.
#[derive(Debug, Default, Deserialize)]
pub struct ConditionalQuery {
    pub actions: Option<String>,
    #[serde(rename = "if")]
    pub check: Option<String>,
    pub then: Option<String>,
    #[serde(rename = "else")]
    pub otherwise: Option<String>,
    pub force: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChainResponse {
    pub success: bool,
    pub commands: Vec<String>,
    pub results: Vec<ExecutionResult>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ExecuteResponse {
    Single(ExecutionResult),
    Chain(ChainResponse),
}

#[derive(Debug, Serialize)]
pub struct FlatResponse {
    pub success: bool,
    pub results: Vec<ExecutionResult>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ConditionalResponse {
    Conditional(ConditionalResult),
    Flat(FlatResponse),
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `true` and `1` (any case) enable force mode.
fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        v.eq_ignore_ascii_case("true") || v == "1"
    })
}

/// Malformed delays fall back to smart delay.
fn parse_delay(value: Option<&str>) -> ChainDelay {
    let millis = value.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(-1);
    ChainDelay::from_millis(millis)
}

/// Execute a single command or a chain.
///
/// `GET|POST /api/intellij-actions/execute?action=<id>`
/// `GET|POST /api/intellij-actions/execute?actions=<a,b,c>&delay=<ms>`
///
/// A single command is only queued on the UI thread; its `success` means the
/// command was accepted. Chains run to completion before responding.
pub async fn execute(
    State(state): State<AppState>,
    Query(query): Query<ExecuteQuery>,
) -> AppResult<Json<ExecuteResponse>> {
    if let Some(id) = non_blank(query.action.as_deref()) {
        info!(command = %id, "Execute request");
        let result = state.engine.execute(id);
        return Ok(Json(ExecuteResponse::Single(result)));
    }

    let Some(actions) = non_blank(query.actions.as_deref()) else {
        return Err(AppError::BadRequest(
            "Missing 'action' or 'actions' parameter".to_string(),
        ));
    };

    let ids = parse_chain(actions);
    if ids.is_empty() {
        return Err(AppError::BadRequest("No commands in 'actions'".to_string()));
    }
    let delay = parse_delay(query.delay.as_deref());
    info!(commands = ?ids, ?delay, "Chain request");

    let engine = state.engine.clone();
    let commands = ids.clone();
    let results = run_blocking(move || engine.execute_chain(&ids, delay)).await?;

    Ok(Json(ExecuteResponse::Chain(ChainResponse {
        success: results.iter().all(|r| r.success),
        commands,
        results,
    })))
}

/// Conditional execution.
///
/// `GET|POST /api/intellij-actions/execute/conditional`
///
/// - `actions=a,b|c` runs an OR-chain: alternatives in order until one succeeds
/// - `if=<predicate>&then=<chain>[&else=<chain>]` branches on a state predicate
/// - plain `actions=a,b` runs the chain as-is
///
/// `force=true` keeps running after failed commands.
pub async fn execute_conditional(
    State(state): State<AppState>,
    Query(query): Query<ConditionalQuery>,
) -> AppResult<Json<ConditionalResponse>> {
    let policy = ChainPolicy::from_force(parse_flag(query.force.as_deref()));
    let actions = non_blank(query.actions.as_deref());

    let condition = match actions {
        Some(text) if text.contains('|') => Some(parse_or_chains(text)),
        _ => match (non_blank(query.check.as_deref()), non_blank(query.then.as_deref())) {
            (Some(check), Some(then)) => parse_if_then_else(check, then, query.otherwise.as_deref()),
            _ => None,
        },
    };

    if let Some(condition) = condition {
        if matches!(&condition, Condition::OrChain { chains } if chains.is_empty()) {
            return Err(AppError::BadRequest("No commands in 'actions'".to_string()));
        }
        let conditional = state.conditional.clone();
        let result = run_blocking(move || conditional.execute(&condition, policy)).await?;
        return Ok(Json(ConditionalResponse::Conditional(result)));
    }

    let ids = actions.map(parse_chain).unwrap_or_default();
    if ids.is_empty() {
        return Err(AppError::BadRequest(
            "No valid conditional or actions provided".to_string(),
        ));
    }

    let engine = state.engine.clone();
    let results = run_blocking(move || engine.run_chain(&ids, ChainDelay::Smart, policy)).await?;
    Ok(Json(ConditionalResponse::Flat(FlatResponse {
        success: policy.is_force() || results.iter().all(|r| r.success),
        results,
    })))
}
