//! User operations

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

impl Database {
    /// Create a user. The email must be unique; a duplicate registration
    /// is a conflict, not a database error.
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let conn = self.conn()?;

        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(Error::Conflict(format!(
                "A user with email {} already exists",
                email
            )));
        }

        conn.execute(
            "INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?)",
            params![name, email, password_hash],
        )?;
        let id = conn.last_insert_rowid();
        info!(user_id = id, "User created");

        self.get_user(id)
    }

    /// Look up a user by email (for login)
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?",
                params![email],
                Self::map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Fetch a user by id, failing with NotFound when absent
    pub fn get_user(&self, id: i64) -> Result<User> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?",
            params![id],
            Self::map_user,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", id)))
    }

    fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: parse_datetime(&row.get::<_, String>(4)?),
        })
    }
}
