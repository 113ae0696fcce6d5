//! HTTP-level integration tests driving the full router.
//!
//! Requests go through the real axum router with an in-memory database,
//! covering the auth extractor, status mapping, and the wire DTOs.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use taskboard::api::{AppState, build_router};
use taskboard::config::AuthConfig;
use taskboard::db::Database;
use tower::util::ServiceExt;

fn test_app() -> Router {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    let auth = Arc::new(AuthConfig {
        jwt_secret: "test-secret".to_string(),
        token_lifetime_seconds: 3600,
    });
    build_router(AppState { db, auth })
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder.body(Body::empty()).expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    (status, String::from_utf8(bytes.to_vec()).expect("Body was not UTF-8"))
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).expect("Body was not JSON")
}

async fn register_and_login(app: &Router, name: &str, password: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        &format!("/auth/register?name={name}&password={password}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, token) = send(
        app,
        "POST",
        &format!("/auth/login?name={name}&password={password}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    token
}

async fn create_project(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/projects?name={name}"),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create project failed: {body}");
    json(&body)["id"].as_str().unwrap().to_string()
}

async fn create_task_state(app: &Router, token: &str, project_id: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/projects/{project_id}/task_states?task_state_name={name}"),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create task state failed: {body}");
    json(&body)["id"].as_str().unwrap().to_string()
}

async fn create_task(app: &Router, token: &str, task_state_id: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/task_states/{task_state_id}/tasks?task_name={name}&description=described"),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create task failed: {body}");
    json(&body)["id"].as_str().unwrap().to_string()
}

/// Reconstruct the board order from task state DTOs by walking the
/// neighbor ids from the head.
fn chain_of(states: &Value) -> Vec<String> {
    let states = states.as_array().expect("expected an array of task states");
    if states.is_empty() {
        return Vec::new();
    }

    let by_id: HashMap<&str, &Value> = states
        .iter()
        .map(|s| (s["id"].as_str().unwrap(), s))
        .collect();

    let mut current = states
        .iter()
        .find(|s| s["left_task_state_id"].is_null())
        .expect("chain has no head");

    let mut names = Vec::new();
    loop {
        names.push(current["name"].as_str().unwrap().to_string());
        match current["right_task_state_id"].as_str() {
            Some(right_id) => current = by_id[right_id],
            None => break,
        }
    }

    assert_eq!(names.len(), states.len(), "chain must cover every state");
    names
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "ok");
}

#[tokio::test]
async fn register_returns_the_new_user() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register?name=alice&password=secret",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let user = json(&body);
    assert_eq!(user["username"], "alice");
    assert!(!user["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn register_duplicate_username_is_bad_request() {
    let app = test_app();
    register_and_login(&app, "alice", "secret").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register?name=alice&password=other",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = test_app();
    register_and_login(&app, "alice", "secret").await;

    let (status, body) = send(&app, "POST", "/auth/login?name=alice&password=wrong", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["error"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn login_with_unknown_user_is_unauthorized() {
    let app = test_app();

    let (status, _) = send(&app, "POST", "/auth/login?name=ghost&password=boo", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let app = test_app();

    let (status, _) = send(&app, "GET", "/api/projects", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/projects", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn blank_project_name_is_bad_request() {
    let app = test_app();
    let token = register_and_login(&app, "alice", "secret").await;

    let (status, body) = send(&app, "POST", "/api/projects?name=%20%20", Some(&token)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "INVALID_FIELD_VALUE");
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let app = test_app();
    let token = register_and_login(&app, "alice", "secret").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/projects/missing/task_states",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "PROJECT_NOT_FOUND");
}

#[tokio::test]
async fn board_flow_orders_task_states() {
    let app = test_app();
    let token = register_and_login(&app, "alice", "secret").await;
    let project_id = create_project(&app, &token, "Board").await;

    let todo = create_task_state(&app, &token, &project_id, "Todo").await;
    create_task_state(&app, &token, &project_id, "Doing").await;
    let done = create_task_state(&app, &token, &project_id, "Done").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}/task_states"),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chain_of(&json(&body)), vec!["Todo", "Doing", "Done"]);

    // Move Done to the head of the board.
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/projects/{project_id}/task_states/{done}/position"),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let moved = json(&body);
    assert!(moved["left_task_state_id"].is_null());
    assert_eq!(moved["right_task_state_id"].as_str(), Some(todo.as_str()));

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}/task_states"),
        Some(&token),
    )
    .await;
    assert_eq!(chain_of(&json(&body)), vec!["Done", "Todo", "Doing"]);

    // Delete the old head; the chain closes around it.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/projects/{project_id}/task_states/{todo}"),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}/task_states"),
        Some(&token),
    )
    .await;
    assert_eq!(chain_of(&json(&body)), vec!["Done", "Doing"]);
}

#[tokio::test]
async fn task_flow_keeps_positions_dense() {
    let app = test_app();
    let token = register_and_login(&app, "alice", "secret").await;
    let project_id = create_project(&app, &token, "Board").await;
    let state = create_task_state(&app, &token, &project_id, "Todo").await;

    let a = create_task(&app, &token, &state, "a").await;
    create_task(&app, &token, &state, "b").await;
    let c = create_task(&app, &token, &state, "c").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/task_states/{state}/tasks"),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tasks = json(&body);
    let names: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    // Move "a" to the end.
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/tasks/{a}/position?new_position=2"),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["position"], 2);

    // One past the end is rejected.
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/tasks/{a}/position?new_position=3"),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "OUT_OF_RANGE");

    // Delete the middle task; the rest renumber to 0 and 1.
    let (status, _) = send(&app, "DELETE", &format!("/api/tasks/{c}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/task_states/{state}/tasks"),
        Some(&token),
    )
    .await;
    let tasks = json(&body);
    let names_and_positions: Vec<(String, i64)> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| {
            (
                t["name"].as_str().unwrap().to_string(),
                t["position"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        names_and_positions,
        vec![("b".to_string(), 0), ("a".to_string(), 1)]
    );
}

#[tokio::test]
async fn foreign_project_is_forbidden() {
    let app = test_app();
    let alice = register_and_login(&app, "alice", "secret").await;
    let bob = register_and_login(&app, "bob", "hunter2").await;
    let project_id = create_project(&app, &alice, "Board").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/projects/{project_id}/task_states?task_state_name=Sneaky"),
        Some(&bob),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"], "NOT_PROJECT_OWNER");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/projects/{project_id}"),
        Some(&bob),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn project_prefix_filter() {
    let app = test_app();
    let token = register_and_login(&app, "alice", "secret").await;
    create_project(&app, &token, "Alpha").await;
    create_project(&app, &token, "Beta").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/projects?prefix_name=al",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let projects = json(&body);
    assert_eq!(projects.as_array().unwrap().len(), 1);
    assert_eq!(projects[0]["name"], "Alpha");
}
