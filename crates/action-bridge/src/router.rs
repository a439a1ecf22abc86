//! Route table.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::require_localhost;
use crate::state::AppState;

/// Prefix every endpoint is served under.
pub const API_PREFIX: &str = "/api/intellij-actions";

/// Build the application router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let command_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/list", get(handlers::list))
        .route("/check", get(handlers::check))
        .route("/search", get(handlers::search))
        .route("/explain", get(handlers::explain));

    let execution_routes = Router::new()
        .route("/execute", get(handlers::execute).post(handlers::execute))
        .route(
            "/execute/conditional",
            get(handlers::execute_conditional).post(handlers::execute_conditional),
        );

    let history_routes = Router::new()
        .route("/history", get(handlers::history))
        .route("/history/clear", post(handlers::clear_history))
        .route("/stats", get(handlers::stats))
        .route("/suggestions", get(handlers::suggestions));

    let state_routes = Router::new()
        .route("/state/query", get(handlers::query_state))
        .route("/state/tool-windows", get(handlers::tool_windows))
        .route("/state/can-execute", get(handlers::can_execute));

    let api = Router::new()
        .merge(command_routes)
        .merge(execution_routes)
        .merge(history_routes)
        .merge(state_routes)
        .with_state(state);

    Router::new().nest(API_PREFIX, api).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(middleware::from_fn(require_localhost)),
    )
}
