//! Project CRUD with per-owner name uniqueness.

use super::{Database, now_ms};
use crate::error::{ApiError, ApiResult};
use crate::types::Project;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Look up a project by id using an existing connection.
pub(crate) fn get_project_internal(
    conn: &Connection,
    project_id: &str,
) -> ApiResult<Option<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, created_at, updated_at FROM projects WHERE id = ?1",
    )?;

    match stmt.query_row(params![project_id], parse_project_row) {
        Ok(project) => Ok(Some(project)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Resolve the project and verify the acting user owns it.
///
/// Every mutation of a project's contents goes through this check before
/// it writes anything; a mismatch aborts the transaction untouched.
pub(crate) fn require_owned_project(
    conn: &Connection,
    project_id: &str,
    user_id: &str,
) -> ApiResult<Project> {
    let project = get_project_internal(conn, project_id)?
        .ok_or_else(|| ApiError::project_not_found(project_id))?;

    if project.user_id != user_id {
        return Err(ApiError::not_project_owner());
    }

    Ok(project)
}

fn find_by_owner_and_name(
    conn: &Connection,
    user_id: &str,
    name: &str,
) -> ApiResult<Option<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, created_at, updated_at FROM projects
         WHERE user_id = ?1 AND name = ?2",
    )?;

    match stmt.query_row(params![user_id, name], parse_project_row) {
        Ok(project) => Ok(Some(project)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Escape LIKE wildcards so a prefix filter matches literally.
fn escape_like(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Database {
    /// All projects of a user, optionally filtered by a case-insensitive
    /// name prefix. A blank prefix is ignored.
    pub fn list_projects(&self, user_id: &str, prefix: Option<&str>) -> ApiResult<Vec<Project>> {
        self.with_conn(|conn| {
            let prefix = prefix.map(str::trim).filter(|p| !p.is_empty());

            let mut stmt;
            let rows = match prefix {
                Some(prefix) => {
                    stmt = conn.prepare(
                        "SELECT id, user_id, name, created_at, updated_at FROM projects
                         WHERE user_id = ?1 AND name LIKE ?2 ESCAPE '\\'
                         ORDER BY created_at",
                    )?;
                    let pattern = format!("{}%", escape_like(prefix));
                    stmt.query_map(params![user_id, pattern], parse_project_row)?
                }
                None => {
                    stmt = conn.prepare(
                        "SELECT id, user_id, name, created_at, updated_at FROM projects
                         WHERE user_id = ?1
                         ORDER BY created_at",
                    )?;
                    stmt.query_map(params![user_id], parse_project_row)?
                }
            };

            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Create a project. Names are unique per owner.
    pub fn create_project(&self, user_id: &str, name: &str) -> ApiResult<Project> {
        if name.trim().is_empty() {
            return Err(ApiError::invalid_value("Name cannot be empty"));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if find_by_owner_and_name(&tx, user_id, name)?.is_some() {
                return Err(ApiError::duplicate_project(name));
            }

            let now = now_ms();
            let project = Project {
                id: Uuid::now_v7().to_string(),
                user_id: user_id.to_string(),
                name: name.to_string(),
                created_at: now,
                updated_at: now,
            };

            tx.execute(
                "INSERT INTO projects (id, user_id, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    project.id,
                    project.user_id,
                    project.name,
                    project.created_at,
                    project.updated_at
                ],
            )?;

            tx.commit()?;
            Ok(project)
        })
    }

    /// Rename a project; the uniqueness check excludes the project itself.
    pub fn rename_project(
        &self,
        user_id: &str,
        project_id: &str,
        name: &str,
    ) -> ApiResult<Project> {
        if name.trim().is_empty() {
            return Err(ApiError::invalid_value("Name cannot be empty"));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut project = require_owned_project(&tx, project_id, user_id)?;

            if let Some(other) = find_by_owner_and_name(&tx, user_id, name)?
                && other.id != project_id
            {
                return Err(ApiError::duplicate_project(name));
            }

            let now = now_ms();
            tx.execute(
                "UPDATE projects SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now, project_id],
            )?;

            tx.commit()?;

            project.name = name.to_string();
            project.updated_at = now;
            Ok(project)
        })
    }

    /// Delete a project and everything on its board.
    pub fn delete_project(&self, user_id: &str, project_id: &str) -> ApiResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            require_owned_project(&tx, project_id, user_id)?;

            // Foreign keys cascade to task states and tasks.
            tx.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;

            tx.commit()?;
            Ok(())
        })
    }
}
