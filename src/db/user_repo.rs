use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::info;

use super::lock;
use crate::models::User;
use crate::utils::AppError;

pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Skapa användare med redan hashat lösenord
    pub fn create(&self, username: &str, password_hash: &str) -> Result<i64> {
        let conn = lock(&self.conn)?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)",
            [username],
            |row| row.get(0),
        )?;
        if exists {
            return Err(AppError::already_exists(format!("Användare '{}'", username)).into());
        }

        conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            params![username, password_hash],
        )?;

        let id = conn.last_insert_rowid();
        info!("Skapade användare '{}'", username);
        Ok(id)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = lock(&self.conn)?;
        let user = conn
            .query_row(
                "SELECT user_id, username, password_hash, created_at FROM users WHERE username = ?",
                [username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        created_at: row.get(3).ok(),
                    })
                },
            )
            .optional()?;

        Ok(user)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}
