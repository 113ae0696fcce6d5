//! Core types for the taskboard server.

use serde::{Deserialize, Serialize};

/// A registered account. Owns projects.
///
/// Never serialized to the wire directly; see [`UserDto`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// A kanban project owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A column ("task state") on a project board.
///
/// Ordering within the project is a doubly-linked chain: `left_id` and
/// `right_id` hold sibling ids, resolved by lookup rather than owned.
/// `left_id == None` marks the head of the chain, `right_id == None` the
/// tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub left_id: Option<String>,
    pub right_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task card. `position` is the dense 0-based index within its task
/// state: for a state holding N tasks the positions are exactly `0..N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub task_state_id: String,
    pub name: String,
    pub description: String,
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

// =============================================================================
// Wire DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDto {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Project> for ProjectDto {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Task state with its neighbor ids and tasks in position order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStateDto {
    pub id: String,
    pub name: String,
    pub left_task_state_id: Option<String>,
    pub right_task_state_id: Option<String>,
    pub tasks: Vec<TaskDto>,
}

impl TaskStateDto {
    pub fn new(state: &TaskState, tasks: &[Task]) -> Self {
        Self {
            id: state.id.clone(),
            name: state.name.clone(),
            left_task_state_id: state.left_id.clone(),
            right_task_state_id: state.right_id.clone(),
            tasks: tasks.iter().map(TaskDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: String,
    pub name: String,
    pub position: i64,
    pub description: String,
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            name: task.name.clone(),
            position: task.position,
            description: task.description.clone(),
        }
    }
}

/// Confirmation payload for delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckDto {
    pub message: String,
}
