//! Task state ("column") chain management.
//!
//! Task states within a project form a doubly-linked chain stored as
//! nullable neighbor ids in the `task_states` table. Every mutation
//! reads the affected neighborhood, recomputes it, and persists each row
//! whose links changed inside a single transaction, so the chain is
//! never observable with a dangling or asymmetric link.

use super::projects::require_owned_project;
use super::{Database, now_ms};
use crate::error::{ApiError, ApiResult};
use crate::types::TaskState;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

fn parse_task_state_row(row: &Row) -> rusqlite::Result<TaskState> {
    Ok(TaskState {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        left_id: row.get("left_id")?,
        right_id: row.get("right_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

const TASK_STATE_COLUMNS: &str =
    "id, project_id, name, left_id, right_id, created_at, updated_at";

/// Look up a task state by id using an existing connection.
pub(crate) fn get_task_state_internal(
    conn: &Connection,
    task_state_id: &str,
) -> ApiResult<Option<TaskState>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_STATE_COLUMNS} FROM task_states WHERE id = ?1"
    ))?;

    match stmt.query_row(params![task_state_id], parse_task_state_row) {
        Ok(state) => Ok(Some(state)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The tail is the unique state of the project with no right neighbor.
fn find_tail(conn: &Connection, project_id: &str) -> ApiResult<Option<TaskState>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_STATE_COLUMNS} FROM task_states
         WHERE project_id = ?1 AND right_id IS NULL"
    ))?;

    match stmt.query_row(params![project_id], parse_task_state_row) {
        Ok(state) => Ok(Some(state)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The head is the unique state of the project with no left neighbor.
fn find_head(conn: &Connection, project_id: &str) -> ApiResult<Option<TaskState>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_STATE_COLUMNS} FROM task_states
         WHERE project_id = ?1 AND left_id IS NULL"
    ))?;

    match stmt.query_row(params![project_id], parse_task_state_row) {
        Ok(state) => Ok(Some(state)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Sibling names are unique case-insensitively within a project.
fn name_taken(
    conn: &Connection,
    project_id: &str,
    name: &str,
    exclude_id: Option<&str>,
) -> ApiResult<bool> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM task_states
             WHERE project_id = ?1 AND LOWER(name) = LOWER(?2)
               AND (?3 IS NULL OR id <> ?3)
         )",
        params![project_id, name, exclude_id],
        |row| row.get(0),
    )?;
    Ok(taken)
}

/// Splice a state out of its chain: link its neighbors to each other.
///
/// The state's own row is untouched; the caller either relinks it
/// elsewhere or deletes it before committing.
fn unlink(conn: &Connection, state: &TaskState) -> ApiResult<()> {
    let now = now_ms();

    if let Some(left_id) = &state.left_id {
        conn.execute(
            "UPDATE task_states SET right_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![state.right_id, now, left_id],
        )?;
    }

    if let Some(right_id) = &state.right_id {
        conn.execute(
            "UPDATE task_states SET left_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![state.left_id, now, right_id],
        )?;
    }

    Ok(())
}

impl Database {
    /// All task states of an owned project, in creation order.
    ///
    /// Clients reconstruct the visual order from the neighbor ids.
    pub fn list_task_states(&self, user_id: &str, project_id: &str) -> ApiResult<Vec<TaskState>> {
        self.with_conn(|conn| {
            require_owned_project(conn, project_id, user_id)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_STATE_COLUMNS} FROM task_states
                 WHERE project_id = ?1
                 ORDER BY created_at"
            ))?;

            let states = stmt
                .query_map(params![project_id], parse_task_state_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(states)
        })
    }

    /// Append a new task state at the tail of the project's chain.
    pub fn create_task_state(
        &self,
        user_id: &str,
        project_id: &str,
        name: &str,
    ) -> ApiResult<TaskState> {
        if name.trim().is_empty() {
            return Err(ApiError::invalid_value("Task state name can't be empty."));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            require_owned_project(&tx, project_id, user_id)?;

            if name_taken(&tx, project_id, name, None)? {
                return Err(ApiError::duplicate_task_state(name));
            }

            let tail = find_tail(&tx, project_id)?;
            let now = now_ms();
            let state = TaskState {
                id: Uuid::now_v7().to_string(),
                project_id: project_id.to_string(),
                name: name.to_string(),
                left_id: tail.as_ref().map(|t| t.id.clone()),
                right_id: None,
                created_at: now,
                updated_at: now,
            };

            tx.execute(
                "INSERT INTO task_states (id, project_id, name, left_id, right_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    state.id,
                    state.project_id,
                    state.name,
                    state.left_id,
                    state.right_id,
                    state.created_at,
                    state.updated_at
                ],
            )?;

            if let Some(tail) = &tail {
                tx.execute(
                    "UPDATE task_states SET right_id = ?1, updated_at = ?2 WHERE id = ?3",
                    params![state.id, now, tail.id],
                )?;
            }

            tx.commit()?;
            Ok(state)
        })
    }

    /// Rename a task state. Ordering is untouched; sibling names stay
    /// unique case-insensitively, excluding the state itself.
    pub fn rename_task_state(
        &self,
        user_id: &str,
        task_state_id: &str,
        name: &str,
    ) -> ApiResult<TaskState> {
        if name.trim().is_empty() {
            return Err(ApiError::invalid_value("Task state name can't be empty."));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut state = get_task_state_internal(&tx, task_state_id)?
                .ok_or_else(|| ApiError::task_state_not_found(task_state_id))?;

            require_owned_project(&tx, &state.project_id, user_id)?;

            if name_taken(&tx, &state.project_id, name, Some(task_state_id))? {
                return Err(ApiError::duplicate_task_state(name));
            }

            let now = now_ms();
            tx.execute(
                "UPDATE task_states SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now, task_state_id],
            )?;

            tx.commit()?;

            state.name = name.to_string();
            state.updated_at = now;
            Ok(state)
        })
    }

    /// Move a task state directly after `left_task_state_id`, or to the
    /// head of the chain when no left neighbor is given.
    ///
    /// Up to five rows change: the old neighbors close the gap, the new
    /// neighbors open one, and the moved state takes its new links.
    pub fn move_task_state(
        &self,
        user_id: &str,
        task_state_id: &str,
        left_task_state_id: Option<&str>,
    ) -> ApiResult<TaskState> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let state = get_task_state_internal(&tx, task_state_id)?
                .ok_or_else(|| ApiError::task_state_not_found(task_state_id))?;

            require_owned_project(&tx, &state.project_id, user_id)?;

            // Moving next to the current left neighbor is a no-op. Bail
            // out before touching any link.
            if state.left_id.as_deref() == left_task_state_id {
                return Ok(state);
            }

            let new_left = match left_task_state_id {
                Some(left_id) => {
                    if left_id == task_state_id {
                        return Err(ApiError::invalid_target(
                            "Left task state id equals changed task state.",
                        ));
                    }

                    let left = get_task_state_internal(&tx, left_id)?
                        .ok_or_else(|| ApiError::task_state_not_found(left_id))?;

                    if left.project_id != state.project_id {
                        return Err(ApiError::invalid_target(
                            "Task state position can be changed only within the same project.",
                        ));
                    }

                    Some(left)
                }
                None => None,
            };

            // Resolve the new right neighbor before any link changes:
            // whatever currently follows the new left, or the current
            // head for a move to the front. A non-empty chain without a
            // head is corrupt, not a reason to skip relinking.
            let new_right_id = match &new_left {
                Some(left) => left.right_id.clone(),
                None => {
                    let head = find_head(&tx, &state.project_id)?
                        .ok_or_else(|| ApiError::chain_corrupted(&state.project_id))?;
                    Some(head.id)
                }
            };

            let now = now_ms();
            unlink(&tx, &state)?;

            let new_left_id = new_left.as_ref().map(|l| l.id.clone());

            if let Some(left_id) = &new_left_id {
                tx.execute(
                    "UPDATE task_states SET right_id = ?1, updated_at = ?2 WHERE id = ?3",
                    params![task_state_id, now, left_id],
                )?;
            }

            if let Some(right_id) = &new_right_id {
                tx.execute(
                    "UPDATE task_states SET left_id = ?1, updated_at = ?2 WHERE id = ?3",
                    params![task_state_id, now, right_id],
                )?;
            }

            tx.execute(
                "UPDATE task_states SET left_id = ?1, right_id = ?2, updated_at = ?3 WHERE id = ?4",
                params![new_left_id, new_right_id, now, task_state_id],
            )?;

            tx.commit()?;

            Ok(TaskState {
                left_id: new_left_id,
                right_id: new_right_id,
                updated_at: now,
                ..state
            })
        })
    }

    /// Remove a task state and its tasks. The neighbors are linked to
    /// each other in the same transaction.
    pub fn delete_task_state(&self, user_id: &str, task_state_id: &str) -> ApiResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let state = get_task_state_internal(&tx, task_state_id)?
                .ok_or_else(|| ApiError::task_state_not_found(task_state_id))?;

            require_owned_project(&tx, &state.project_id, user_id)?;

            unlink(&tx, &state)?;

            tx.execute(
                "DELETE FROM tasks WHERE task_state_id = ?1",
                params![task_state_id],
            )?;
            tx.execute(
                "DELETE FROM task_states WHERE id = ?1",
                params![task_state_id],
            )?;

            tx.commit()?;
            Ok(())
        })
    }
}
