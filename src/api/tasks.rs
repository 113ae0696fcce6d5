//! Task handlers.

use super::{AppState, AuthUser};
use crate::error::ApiResult;
use crate::types::{AckDto, TaskDto};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

pub async fn get_tasks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_state_id): Path<String>,
) -> ApiResult<Json<Vec<TaskDto>>> {
    let tasks = state.db.list_tasks(&user.id, &task_state_id)?;
    Ok(Json(tasks.iter().map(TaskDto::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskQuery {
    pub task_name: String,
    pub description: String,
}

pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_state_id): Path<String>,
    Query(query): Query<CreateTaskQuery>,
) -> ApiResult<Json<TaskDto>> {
    let task = state.db.create_task(
        &user.id,
        &task_state_id,
        &query.task_name,
        &query.description,
    )?;

    Ok(Json(TaskDto::from(&task)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskQuery {
    pub task_name: Option<String>,
    pub description: Option<String>,
}

pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<String>,
    Query(query): Query<UpdateTaskQuery>,
) -> ApiResult<Json<TaskDto>> {
    let task = state.db.update_task(
        &user.id,
        &task_id,
        query.task_name.as_deref(),
        query.description.as_deref(),
    )?;

    Ok(Json(TaskDto::from(&task)))
}

#[derive(Debug, Deserialize)]
pub struct MoveTaskQuery {
    pub new_position: i64,
}

pub async fn change_task_position(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<String>,
    Query(query): Query<MoveTaskQuery>,
) -> ApiResult<Json<TaskDto>> {
    let task = state.db.move_task(&user.id, &task_id, query.new_position)?;
    Ok(Json(TaskDto::from(&task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<AckDto>> {
    state.db.delete_task(&user.id, &task_id)?;

    Ok(Json(AckDto {
        message: format!("Task with id - \"{}\" was successfully deleted", task_id),
    }))
}
