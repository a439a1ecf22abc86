//! Command discovery endpoints: list, check, search, explain.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::engine::explain::describe;
use crate::engine::{CommandRequirements, TimingCategory};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::{Query, required, MAX_LISTED_COMMANDS};

/// Query parameters naming a single command.
#[derive(Debug, Default, Deserialize)]
pub struct CommandQuery {
    pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub commands: Vec<String>,
    /// Total number of registered commands, not just those returned.
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub command_id: String,
    pub exists: bool,
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub commands: Vec<String>,
    pub count: usize,
    pub truncated: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainResponse {
    pub command_id: String,
    pub exists: bool,
    pub category: TimingCategory,
    /// Category delay in milliseconds
    pub smart_delay: u64,
    pub requirements: CommandRequirements,
    pub description: &'static str,
}

/// List registered command ids.
///
/// `GET /api/intellij-actions/list`
pub async fn list(State(state): State<AppState>) -> Json<ListResponse> {
    let mut ids = state.registry.list_ids();
    ids.sort();
    let count = ids.len();
    ids.truncate(MAX_LISTED_COMMANDS);

    Json(ListResponse {
        commands: ids,
        count,
    })
}

/// Check whether a command exists.
///
/// `GET /api/intellij-actions/check?action=<id>`
pub async fn check(
    State(state): State<AppState>,
    Query(query): Query<CommandQuery>,
) -> AppResult<Json<CheckResponse>> {
    let id = required(&query.action, "action")?;
    let exists = state.registry.exists(id);

    Ok(Json(CheckResponse {
        command_id: id.to_string(),
        exists,
        available: exists,
    }))
}

/// Search command ids.
///
/// `GET /api/intellij-actions/search?q=<text>`
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchResponse> {
    let text = query.q.unwrap_or_default();
    let mut ids = state.registry.list_ids();
    ids.sort();

    let mut matches = search_commands(&ids, &text);
    let count = matches.len();
    let truncated = count > MAX_LISTED_COMMANDS;
    matches.truncate(MAX_LISTED_COMMANDS);

    Json(SearchResponse {
        query: text,
        commands: matches,
        count,
        truncated,
    })
}

/// Explain how a command will be scheduled and what it needs.
///
/// `GET /api/intellij-actions/explain?action=<id>`
///
/// # Returns
///
/// - `400 Bad Request` without an `action` parameter
/// - `404 Not Found` for an unknown command
pub async fn explain(
    State(state): State<AppState>,
    Query(query): Query<CommandQuery>,
) -> AppResult<Json<ExplainResponse>> {
    let id = required(&query.action, "action")?;
    if !state.registry.exists(id) {
        return Err(AppError::NotFound(format!("Command not found: {}", id)));
    }

    let category = state.classifier.classify(id);
    Ok(Json(ExplainResponse {
        command_id: id.to_string(),
        exists: true,
        category,
        smart_delay: category.delay_ms(),
        requirements: CommandRequirements::infer(id),
        description: describe(id),
    }))
}

/// Case-insensitive match of `query` against whole ids and their
/// `.`/`_`/`-` separated segments. A blank query matches nothing.
pub fn search_commands(ids: &[String], query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    ids.iter()
        .filter(|id| {
            let lower = id.to_lowercase();
            lower.contains(&needle)
                || lower
                    .split(['.', '_', '-'])
                    .any(|segment| segment.starts_with(&needle))
        })
        .cloned()
        .collect()
}
