//! Task state handlers.
//!
//! Mutations resolve the enclosing project from the target task state
//! itself; the `project_id` path segment never widens access.

use super::{AppState, AuthUser};
use crate::db::Database;
use crate::error::ApiResult;
use crate::types::{AckDto, TaskState, TaskStateDto};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

fn state_dto(db: &Database, user_id: &str, state: &TaskState) -> ApiResult<TaskStateDto> {
    let tasks = db.list_tasks(user_id, &state.id)?;
    Ok(TaskStateDto::new(state, &tasks))
}

pub async fn get_task_states(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<TaskStateDto>>> {
    let states = state.db.list_task_states(&user.id, &project_id)?;

    let mut dtos = Vec::with_capacity(states.len());
    for task_state in &states {
        dtos.push(state_dto(&state.db, &user.id, task_state)?);
    }

    Ok(Json(dtos))
}

#[derive(Debug, Deserialize)]
pub struct TaskStateNameQuery {
    pub task_state_name: String,
}

pub async fn create_task_state(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<String>,
    Query(query): Query<TaskStateNameQuery>,
) -> ApiResult<Json<TaskStateDto>> {
    let task_state = state
        .db
        .create_task_state(&user.id, &project_id, &query.task_state_name)?;

    // A freshly appended state has no tasks yet.
    Ok(Json(TaskStateDto::new(&task_state, &[])))
}

pub async fn update_task_state(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((_project_id, task_state_id)): Path<(String, String)>,
    Query(query): Query<TaskStateNameQuery>,
) -> ApiResult<Json<TaskStateDto>> {
    let task_state = state
        .db
        .rename_task_state(&user.id, &task_state_id, &query.task_state_name)?;

    Ok(Json(state_dto(&state.db, &user.id, &task_state)?))
}

#[derive(Debug, Deserialize)]
pub struct ChangePositionQuery {
    pub left_task_state_id: Option<String>,
}

pub async fn change_task_state_position(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((_project_id, task_state_id)): Path<(String, String)>,
    Query(query): Query<ChangePositionQuery>,
) -> ApiResult<Json<TaskStateDto>> {
    let task_state = state.db.move_task_state(
        &user.id,
        &task_state_id,
        query.left_task_state_id.as_deref(),
    )?;

    Ok(Json(state_dto(&state.db, &user.id, &task_state)?))
}

pub async fn delete_task_state(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((_project_id, task_state_id)): Path<(String, String)>,
) -> ApiResult<Json<AckDto>> {
    state.db.delete_task_state(&user.id, &task_state_id)?;

    Ok(Json(AckDto {
        message: format!(
            "Task state with id - \"{}\" was successfully deleted",
            task_state_id
        ),
    }))
}
