//! Project handlers.

use super::{AppState, AuthUser};
use crate::error::ApiResult;
use crate::types::{AckDto, ProjectDto};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FetchProjectsQuery {
    pub prefix_name: Option<String>,
}

pub async fn fetch_projects(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<FetchProjectsQuery>,
) -> ApiResult<Json<Vec<ProjectDto>>> {
    let projects = state
        .db
        .list_projects(&user.id, query.prefix_name.as_deref())?;

    Ok(Json(projects.iter().map(ProjectDto::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ProjectNameQuery {
    pub name: String,
}

pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ProjectNameQuery>,
) -> ApiResult<Json<ProjectDto>> {
    let project = state.db.create_project(&user.id, &query.name)?;
    Ok(Json(ProjectDto::from(&project)))
}

pub async fn edit_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<String>,
    Query(query): Query<ProjectNameQuery>,
) -> ApiResult<Json<ProjectDto>> {
    let project = state.db.rename_project(&user.id, &project_id, &query.name)?;
    Ok(Json(ProjectDto::from(&project)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<String>,
) -> ApiResult<Json<AckDto>> {
    state.db.delete_project(&user.id, &project_id)?;

    Ok(Json(AckDto {
        message: format!(
            "Project with id - \"{}\" was successfully deleted",
            project_id
        ),
    }))
}
