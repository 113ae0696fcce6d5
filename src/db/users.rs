//! User rows backing registration and login.

use super::{Database, now_ms};
use crate::error::{ApiError, ApiResult};
use crate::types::User;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}

/// Look up a user by username using an existing connection.
pub(crate) fn get_user_by_username_internal(
    conn: &Connection,
    username: &str,
) -> ApiResult<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
    )?;

    match stmt.query_row(params![username], parse_user_row) {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Insert a new user with an already-hashed password.
    pub fn create_user(&self, username: &str, password_hash: &str) -> ApiResult<User> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if get_user_by_username_internal(&tx, username)?.is_some() {
                return Err(ApiError::username_taken());
            }

            let user = User {
                id: Uuid::now_v7().to_string(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: now_ms(),
            };

            tx.execute(
                "INSERT INTO users (id, username, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user.id, user.username, user.password_hash, user.created_at],
            )?;

            tx.commit()?;
            Ok(user)
        })
    }

    /// Look up a user by username.
    pub fn get_user_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        self.with_conn(|conn| get_user_by_username_internal(conn, username))
    }
}
