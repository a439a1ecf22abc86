//! History and statistics endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::history::{CommandStats, HistoryEntry, UsagePattern};
use crate::state::AppState;

use super::{run_blocking, Query};

const DEFAULT_HISTORY_LIMIT: usize = 50;
const DEFAULT_STATS_LIMIT: usize = 20;
const SUGGESTED_PATTERNS: usize = 5;
const PATTERN_MIN_FREQUENCY: u64 = 3;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub action: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCommandsResponse {
    pub top_commands: Vec<CommandStats>,
    pub count: usize,
}

/// Returned with `200` when a command has never run.
#[derive(Debug, Serialize)]
pub struct NoStatsResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatsResponse {
    Command(CommandStats),
    Missing(NoStatsResponse),
    Top(TopCommandsResponse),
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
    pub patterns: Vec<UsagePattern>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
}

/// Recent executions, newest first.
///
/// `GET /api/intellij-actions/history?limit=<n>`
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let history = state
        .history
        .recent_history(query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT));
    Json(HistoryResponse {
        count: history.len(),
        history,
    })
}

/// Statistics for one command, or the most used commands.
///
/// `GET /api/intellij-actions/stats?action=<id>`
/// `GET /api/intellij-actions/stats?limit=<n>`
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Json<StatsResponse> {
    if let Some(id) = query.action.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        let response = match state.history.stats_for(id) {
            Some(stats) => StatsResponse::Command(stats),
            None => StatsResponse::Missing(NoStatsResponse {
                success: false,
                error: format!("No statistics available for command: {}", id),
            }),
        };
        return Json(response);
    }

    let top_commands = state
        .history
        .top_commands(query.limit.unwrap_or(DEFAULT_STATS_LIMIT));
    Json(StatsResponse::Top(TopCommandsResponse {
        count: top_commands.len(),
        top_commands,
    }))
}

/// Usage hints and the most frequent chains.
///
/// `GET /api/intellij-actions/suggestions`
pub async fn suggestions(State(state): State<AppState>) -> Json<SuggestionsResponse> {
    let mut patterns = state.history.common_patterns(PATTERN_MIN_FREQUENCY);
    patterns.truncate(SUGGESTED_PATTERNS);
    Json(SuggestionsResponse {
        suggestions: state.history.suggestions(),
        patterns,
    })
}

/// Forget all history and statistics.
///
/// `POST /api/intellij-actions/history/clear`
pub async fn clear_history(State(state): State<AppState>) -> AppResult<Json<ClearResponse>> {
    let history = state.history.clone();
    run_blocking(move || history.clear()).await?;
    Ok(Json(ClearResponse {
        success: true,
        message: "History cleared".to_string(),
    }))
}
