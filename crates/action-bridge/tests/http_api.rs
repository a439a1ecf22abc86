//! End-to-end tests of the HTTP surface against an in-memory host.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use action_bridge::{
    config::AppConfig,
    history::HistoryStore,
    host::memory::{CommandSpec, Requirement},
    host::InMemoryHost,
    router::build_router,
    state::AppState,
};

fn test_host() -> InMemoryHost {
    InMemoryHost::new()
        .with_commands(["SaveAll", "CustomOne", "CustomTwo", "Git.Push"])
        .with_command(CommandSpec::new("ReformatCode").requires(Requirement::Editor))
        .with_command(CommandSpec::new("Git.Pull").failing("remote rejected"))
        .with_state(|s| s.project = true)
}

fn app_with(host: InMemoryHost) -> (Arc<InMemoryHost>, Arc<HistoryStore>, Router) {
    let host = Arc::new(host);
    let history = Arc::new(HistoryStore::in_memory());
    let state = AppState::for_host(AppConfig::default(), host.clone(), history.clone())
        .expect("state");
    (host, history, build_router(state))
}

fn app() -> Router {
    app_with(test_host()).2
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "localhost:63343")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri).await
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(&app(), "/api/intellij-actions/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["port"], 63343);
    assert_eq!(body["commandCount"], 6);
}

#[tokio::test]
async fn test_rejects_non_local_host() {
    let request = Request::builder()
        .uri("/api/intellij-actions/health")
        .header(header::HOST, "example.com")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri("/api/intellij-actions/health")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_check_and_search() {
    let app = app();

    let (status, body) = get(&app, "/api/intellij-actions/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 6);
    assert_eq!(body["commands"][0], "CustomOne");

    let (_, body) = get(&app, "/api/intellij-actions/check?action=SaveAll").await;
    assert_eq!(body["exists"], true);
    assert_eq!(body["commandId"], "SaveAll");

    let (_, body) = get(&app, "/api/intellij-actions/check?action=Nope").await;
    assert_eq!(body["exists"], false);

    let (status, body) = get(&app, "/api/intellij-actions/check").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = get(&app, "/api/intellij-actions/search?q=git").await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["truncated"], false);
    assert_eq!(body["commands"], serde_json::json!(["Git.Pull", "Git.Push"]));
}

#[tokio::test]
async fn test_explain() {
    let app = app();

    let (status, body) = get(&app, "/api/intellij-actions/explain?action=SaveAll").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "instant");
    assert_eq!(body["smartDelay"], 0);
    assert_eq!(body["description"], "Save all modified files");
    assert_eq!(body["requirements"]["needsProject"], true);

    let (status, body) = get(&app, "/api/intellij-actions/explain?action=Nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    let (status, _) = get(&app, "/api/intellij-actions/explain").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_execute_single_and_unknown() {
    let (host, history, app) = app_with(test_host());

    let (status, body) = send(&app, Method::POST, "/api/intellij-actions/execute?action=SaveAll").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["commandId"], "SaveAll");

    let (status, body) = get(&app, "/api/intellij-actions/execute?action=Nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorKind"], "NotFound");

    let (status, _) = get(&app, "/api/intellij-actions/execute").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(history.len(), 2);
    // The single execution is queued; a chain on the same thread runs after it.
    let (_, body) = get(&app, "/api/intellij-actions/execute?actions=CustomOne").await;
    assert_eq!(body["success"], true);
    assert_eq!(host.invocations(), vec!["SaveAll", "CustomOne"]);
}

#[tokio::test]
async fn test_execute_chain_stops_at_failure() {
    let (host, _, app) = app_with(test_host());

    let (status, body) = get(
        &app,
        "/api/intellij-actions/execute?actions=CustomOne,Git.Pull,CustomTwo&delay=0",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["commands"].as_array().unwrap().len(), 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["results"][1]["error"], "remote rejected");
    assert_eq!(host.invocations(), vec!["CustomOne", "Git.Pull"]);
}

#[tokio::test]
async fn test_conditional_or_chain() {
    let app = app();

    let (status, body) = get(
        &app,
        "/api/intellij-actions/execute/conditional?actions=Git.Pull|CustomOne",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["executedCommands"], serde_json::json!(["Git.Pull", "CustomOne"]));
}

#[tokio::test]
async fn test_conditional_if_then_else() {
    let (host, _, app) = app_with(test_host());

    let (_, body) = get(
        &app,
        "/api/intellij-actions/execute/conditional?if=editor&then=ReformatCode&else=SaveAll",
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["conditionMet"], false);
    assert_eq!(body["executedCommands"], serde_json::json!(["SaveAll"]));

    host.update_state(|s| s.editor = true);
    let (_, body) = get(
        &app,
        "/api/intellij-actions/execute/conditional?if=editor&then=ReformatCode&else=SaveAll",
    )
    .await;
    assert_eq!(body["conditionMet"], true);
    assert_eq!(body["executedCommands"], serde_json::json!(["ReformatCode"]));
}

#[tokio::test]
async fn test_conditional_flat_fallback_and_force() {
    let app = app();

    let (_, body) = get(
        &app,
        "/api/intellij-actions/execute/conditional?actions=Git.Pull,CustomOne",
    )
    .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    let (_, body) = get(
        &app,
        "/api/intellij-actions/execute/conditional?actions=Git.Pull,CustomOne&force=true",
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    let (status, body) = get(&app, "/api/intellij-actions/execute/conditional").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid conditional or actions provided");
}

#[tokio::test]
async fn test_state_endpoints() {
    let app = app();

    let (status, body) = get(
        &app,
        "/api/intellij-actions/state/query?checks=project,!editor,totallyBogus,not:totallyBogus",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"], true);
    assert_eq!(body["!editor"], true);
    assert_eq!(body["totallyBogus"], false);
    assert_eq!(body["not:totallyBogus"], true);

    let (status, _) = get(&app, "/api/intellij-actions/state/query").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(
        &app,
        "/api/intellij-actions/state/can-execute?actions=SaveAll,ReformatCode,Nope",
    )
    .await;
    assert_eq!(body["SaveAll"], true);
    assert_eq!(body["ReformatCode"], false);
    assert_eq!(body["Nope"], false);

    let (status, body) = get(&app, "/api/intellij-actions/state/tool-windows").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_object());
}

#[tokio::test]
async fn test_history_stats_and_clear() {
    let app = app();

    get(&app, "/api/intellij-actions/execute?actions=SaveAll,CustomOne&delay=0").await;

    let (_, body) = get(&app, "/api/intellij-actions/history?limit=10").await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["history"][0]["commandId"], "CustomOne");
    assert_eq!(body["history"][1]["chainedWith"], serde_json::json!(["CustomOne"]));

    let (_, body) = get(&app, "/api/intellij-actions/stats?action=SaveAll").await;
    assert_eq!(body["executionCount"], 1);
    assert_eq!(body["commonlyChainedWith"]["CustomOne"], 1);

    let (status, body) = get(&app, "/api/intellij-actions/stats?action=Nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "No statistics available for command: Nope");

    let (_, body) = get(&app, "/api/intellij-actions/stats").await;
    assert_eq!(body["count"], 2);

    let (_, body) = get(&app, "/api/intellij-actions/suggestions").await;
    assert!(body["suggestions"].is_array());
    assert!(body["patterns"].is_array());

    let (status, body) = send(&app, Method::POST, "/api/intellij-actions/history/clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = get(&app, "/api/intellij-actions/history").await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_list_and_search_are_capped() {
    let ids: Vec<String> = (0..150).map(|i| format!("Bulk.Item{:03}", i)).collect();
    let app = app_with(InMemoryHost::new().with_commands(ids)).2;

    let (_, body) = get(&app, "/api/intellij-actions/list").await;
    assert_eq!(body["count"], 150);
    assert_eq!(body["commands"].as_array().unwrap().len(), 100);
    assert_eq!(body["commands"][0], "Bulk.Item000");

    let (_, body) = get(&app, "/api/intellij-actions/search?q=item").await;
    assert_eq!(body["count"], 150);
    assert_eq!(body["commands"].as_array().unwrap().len(), 100);
    assert_eq!(body["truncated"], true);

    let (_, body) = get(&app, "/api/intellij-actions/search?q=item14").await;
    assert_eq!(body["count"], 10);
    assert_eq!(body["truncated"], false);
}

#[tokio::test]
async fn test_malformed_query_is_json_bad_request() {
    let app = app();

    for uri in [
        "/api/intellij-actions/history?limit=abc",
        "/api/intellij-actions/stats?limit=-3",
    ] {
        let request = Request::builder()
            .uri(uri)
            .header(header::HOST, "localhost")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], 400);
        assert!(body["error"].as_str().unwrap().contains("limit"));
    }
}
