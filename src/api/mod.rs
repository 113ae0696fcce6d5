//! HTTP API surface.
//!
//! Builds the axum router and owns the pieces every handler shares:
//! application state and the `AuthUser` extractor that resolves the
//! acting user from a bearer token.

mod auth;
mod projects;
mod task_states;
mod tasks;

use crate::auth::validate_token;
use crate::config::AuthConfig;
use crate::db::Database;
use crate::error::ApiError;
use crate::types::User;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header;
use axum::response::Json;
use axum::routing::{get, patch, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthConfig>,
}

/// The authenticated caller, resolved from the Authorization header.
///
/// Ownership checks compare against this user; handlers receive it
/// explicitly instead of reading any process-wide context.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(ApiError::invalid_credentials)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(ApiError::invalid_credentials)?;

        let username = validate_token(&state.auth.jwt_secret, token)
            .map_err(|_| ApiError::invalid_credentials())?;

        let user = state
            .db
            .get_user_by_username(&username)?
            .ok_or_else(ApiError::invalid_credentials)?;

        Ok(AuthUser(user))
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Identity
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Projects
        .route(
            "/api/projects",
            get(projects::fetch_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/{project_id}",
            patch(projects::edit_project).delete(projects::delete_project),
        )
        // Task states
        .route(
            "/api/projects/{project_id}/task_states",
            get(task_states::get_task_states).post(task_states::create_task_state),
        )
        .route(
            "/api/projects/{project_id}/task_states/{task_state_id}",
            patch(task_states::update_task_state).delete(task_states::delete_task_state),
        )
        .route(
            "/api/projects/{project_id}/task_states/{task_state_id}/position",
            patch(task_states::change_task_state_position),
        )
        // Tasks
        .route(
            "/api/task_states/{task_state_id}/tasks",
            get(tasks::get_tasks).post(tasks::create_task),
        )
        .route(
            "/api/tasks/{task_id}",
            patch(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/api/tasks/{task_id}/position", patch(tasks::change_task_position))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
