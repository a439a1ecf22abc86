//! Health check endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Always "healthy" while the server answers
    pub status: String,
    pub service: String,
    pub version: String,
    pub port: u16,
    /// Number of commands the host currently exposes
    pub command_count: usize,
    pub uptime_seconds: u64,
}

/// Health check endpoint.
///
/// `GET /api/intellij-actions/health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        port: state.config.port,
        command_count: state.registry.list_ids().len(),
        uptime_seconds: state.uptime_seconds(),
    })
}
