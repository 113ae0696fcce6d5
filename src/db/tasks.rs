//! Task sequence management within a task state.
//!
//! Tasks in a state carry a dense 0-based `position`: after every
//! mutation the stored positions are exactly `0..N` in list order. Moves
//! and deletes rewrite every displaced row in the same transaction; the
//! full renumber is O(N) but also heals any stray numbering it finds.

use super::projects::require_owned_project;
use super::task_states::get_task_state_internal;
use super::{Database, now_ms};
use crate::error::{ApiError, ApiResult};
use crate::types::{Task, TaskState};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        task_state_id: row.get("task_state_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

const TASK_COLUMNS: &str =
    "id, task_state_id, name, description, position, created_at, updated_at";

fn get_task_internal(conn: &Connection, task_id: &str) -> ApiResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn list_tasks_internal(conn: &Connection, task_state_id: &str) -> ApiResult<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE task_state_id = ?1 ORDER BY position"
    ))?;

    let tasks = stmt
        .query_map(params![task_state_id], parse_task_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tasks)
}

/// Resolve a task's state and check ownership in one step.
fn require_owned_task_state(
    conn: &Connection,
    task_state_id: &str,
    user_id: &str,
) -> ApiResult<TaskState> {
    let state = get_task_state_internal(conn, task_state_id)?
        .ok_or_else(|| ApiError::task_state_not_found(task_state_id))?;

    require_owned_project(conn, &state.project_id, user_id)?;

    Ok(state)
}

/// Rewrite positions so the slice order becomes `0..N`, touching only
/// rows whose stored position differs.
fn renumber(conn: &Connection, tasks: &[Task]) -> ApiResult<()> {
    let now = now_ms();

    for (index, task) in tasks.iter().enumerate() {
        let position = index as i64;
        if task.position != position {
            conn.execute(
                "UPDATE tasks SET position = ?1, updated_at = ?2 WHERE id = ?3",
                params![position, now, task.id],
            )?;
        }
    }

    Ok(())
}

impl Database {
    /// All tasks of a task state, in position order.
    pub fn list_tasks(&self, user_id: &str, task_state_id: &str) -> ApiResult<Vec<Task>> {
        self.with_conn(|conn| {
            require_owned_task_state(conn, task_state_id, user_id)?;
            list_tasks_internal(conn, task_state_id)
        })
    }

    /// Append a task at the end of the state's sequence.
    ///
    /// The new position is one past the current maximum, so no existing
    /// row needs renumbering.
    pub fn create_task(
        &self,
        user_id: &str,
        task_state_id: &str,
        name: &str,
        description: &str,
    ) -> ApiResult<Task> {
        if name.trim().is_empty() {
            return Err(ApiError::invalid_value("Task's name can't be empty."));
        }
        if description.trim().is_empty() {
            return Err(ApiError::invalid_value("Task's description can't be empty."));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            require_owned_task_state(&tx, task_state_id, user_id)?;

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM tasks WHERE task_state_id = ?1",
                params![task_state_id],
                |row| row.get(0),
            )?;

            let now = now_ms();
            let task = Task {
                id: Uuid::now_v7().to_string(),
                task_state_id: task_state_id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                position: count,
                created_at: now,
                updated_at: now,
            };

            tx.execute(
                "INSERT INTO tasks (id, task_state_id, name, description, position, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id,
                    task.task_state_id,
                    task.name,
                    task.description,
                    task.position,
                    task.created_at,
                    task.updated_at
                ],
            )?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Update a task's name and/or description. A supplied-but-blank
    /// field is rejected; the position is untouched.
    pub fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ApiResult<Task> {
        if let Some(name) = name
            && name.trim().is_empty()
        {
            return Err(ApiError::invalid_value("Task's name can't be empty."));
        }
        if let Some(description) = description
            && description.trim().is_empty()
        {
            return Err(ApiError::invalid_value("Task's description can't be empty."));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;

            require_owned_task_state(&tx, &task.task_state_id, user_id)?;

            if let Some(name) = name {
                task.name = name.to_string();
            }
            if let Some(description) = description {
                task.description = description.to_string();
            }
            task.updated_at = now_ms();

            tx.execute(
                "UPDATE tasks SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                params![task.name, task.description, task.updated_at, task_id],
            )?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Move a task to `new_position` within its state, renumbering every
    /// displaced sibling.
    pub fn move_task(&self, user_id: &str, task_id: &str, new_position: i64) -> ApiResult<Task> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;

            require_owned_task_state(&tx, &task.task_state_id, user_id)?;

            let mut tasks = list_tasks_internal(&tx, &task.task_state_id)?;

            if new_position < 0 || new_position >= tasks.len() as i64 {
                return Err(ApiError::out_of_range());
            }

            // Reorder in memory by identity, then persist the dense result.
            let index = tasks
                .iter()
                .position(|t| t.id == task_id)
                .ok_or_else(|| ApiError::internal("task missing from its own state"))?;
            let moved = tasks.remove(index);
            tasks.insert(new_position as usize, moved);

            renumber(&tx, &tasks)?;

            let task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Delete a task and close the gap it leaves.
    pub fn delete_task(&self, user_id: &str, task_id: &str) -> ApiResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;

            require_owned_task_state(&tx, &task.task_state_id, user_id)?;

            tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;

            let remaining = list_tasks_internal(&tx, &task.task_state_id)?;
            renumber(&tx, &remaining)?;

            tx.commit()?;
            Ok(())
        })
    }
}
