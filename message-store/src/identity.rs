//! Identity collaborators: mapping user and room names to internal ids.
//!
//! The store only depends on [`UserDirectory`] and [`RoomDirectory`];
//! [`SqliteDirectory`] implements both over the `users` and `chatrooms` tables.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// Resolves a username to its id. `Ok(None)` means the user is unknown.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve_user_id(&self, username: &str) -> anyhow::Result<Option<i64>>;
}

/// Resolves a room name to its id. `Ok(None)` means the room is unknown.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn resolve_room_id(&self, room: &str) -> anyhow::Result<Option<i64>>;
}

/// Directory backed by the same SQLite database as the messages.
#[derive(Clone)]
pub struct SqliteDirectory {
    pool: SqlitePool,
}

impl SqliteDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Registers `username` if it is new and returns its id.
    pub async fn register_user(&self, username: &str) -> Result<i64> {
        sqlx::query("INSERT OR IGNORE INTO users (username) VALUES (?)")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(StoreError::write)?;

        let (id,): (i64,) = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::query)?;

        info!(username, user_id = id, "Registered user");
        Ok(id)
    }

    /// Creates room `name` if it is new and returns its id.
    pub async fn create_room(&self, name: &str) -> Result<i64> {
        sqlx::query("INSERT OR IGNORE INTO chatrooms (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(StoreError::write)?;

        let (id,): (i64,) = sqlx::query_as("SELECT id FROM chatrooms WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::query)?;

        info!(room = name, room_id = id, "Created room");
        Ok(id)
    }
}

#[async_trait]
impl UserDirectory for SqliteDirectory {
    async fn resolve_user_id(&self, username: &str) -> anyhow::Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        debug!(username, found = row.is_some(), "Resolved user");
        Ok(row.map(|r| r.0))
    }
}

#[async_trait]
impl RoomDirectory for SqliteDirectory {
    async fn resolve_room_id(&self, room: &str) -> anyhow::Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM chatrooms WHERE name = ?")
            .bind(room)
            .fetch_optional(&self.pool)
            .await?;

        debug!(room, found = row.is_some(), "Resolved room");
        Ok(row.map(|r| r.0))
    }
}
