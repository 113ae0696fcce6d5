//! Registration and login handlers.

use super::AppState;
use crate::auth::{generate_token, hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::types::UserDto;
use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct CredentialsQuery {
    pub name: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Query(query): Query<CredentialsQuery>,
) -> ApiResult<Json<UserDto>> {
    if query.name.trim().is_empty() {
        return Err(ApiError::invalid_value("Name cannot be empty"));
    }
    if query.password.trim().is_empty() {
        return Err(ApiError::invalid_value("Password cannot be empty"));
    }

    let password_hash = hash_password(&query.password).map_err(ApiError::internal)?;
    let user = state.db.create_user(&query.name, &password_hash)?;

    info!(username = %user.username, "registered user");

    Ok(Json(UserDto::from(&user)))
}

/// Returns the raw access token as the response body.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<CredentialsQuery>,
) -> ApiResult<String> {
    let user = state
        .db
        .get_user_by_username(&query.name)?
        .ok_or_else(ApiError::invalid_credentials)?;

    if !verify_password(&query.password, &user.password_hash) {
        warn!(username = %query.name, "rejected login");
        return Err(ApiError::invalid_credentials());
    }

    generate_token(
        &state.auth.jwt_secret,
        &user.username,
        state.auth.token_lifetime_seconds,
    )
    .map_err(ApiError::internal)
}
