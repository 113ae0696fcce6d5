//! Structured error types for API responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidFieldValue,
    DuplicateName,
    InvalidTarget,
    OutOfRange,

    // Not found errors
    ProjectNotFound,
    TaskStateNotFound,
    TaskNotFound,

    // Auth errors
    UsernameTaken,
    InvalidCredentials,
    NotProjectOwner,

    // Internal errors
    ChainCorrupted,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status this code maps to.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ProjectNotFound
            | ErrorCode::TaskStateNotFound
            | ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::NotProjectOwner => StatusCode::FORBIDDEN,
            ErrorCode::ChainCorrupted | ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Structured error returned by handlers and database operations.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(rename = "error")]
    pub code: ErrorCode,
    #[serde(rename = "error_description")]
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    // Convenience constructors

    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason)
    }

    pub fn project_not_found(project_id: &str) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project with \"{}\" doesn't exist.", project_id),
        )
    }

    pub fn task_state_not_found(task_state_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskStateNotFound,
            format!("Task state \"{}\" doesn't exist.", task_state_id),
        )
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task \"{}\" doesn't exist.", task_id),
        )
    }

    pub fn duplicate_project(name: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateName,
            format!("Project \"{}\" already exists", name),
        )
    }

    pub fn duplicate_task_state(name: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateName,
            format!("Task state \"{}\" already exists.", name),
        )
    }

    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTarget, reason)
    }

    pub fn out_of_range() -> Self {
        Self::new(ErrorCode::OutOfRange, "Invalid position value.")
    }

    pub fn username_taken() -> Self {
        Self::new(ErrorCode::UsernameTaken, "Username is already taken")
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Invalid credentials")
    }

    pub fn not_project_owner() -> Self {
        Self::new(
            ErrorCode::NotProjectOwner,
            "You do not have permission to access this project.",
        )
    }

    pub fn chain_corrupted(project_id: &str) -> Self {
        Self::new(
            ErrorCode::ChainCorrupted,
            format!(
                "Task state chain of project \"{}\" has no head.",
                project_id
            ),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
