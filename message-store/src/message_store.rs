//! Message store: append, paginate and incrementally sync room and direct messages.
//!
//! Every batch read is newest first (`ORDER BY id DESC`). The `*_since` reads
//! return only ids strictly greater than the caller's cursor, so a poller that
//! remembers the highest id it has seen never re-reads history.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::config::{IdentityPolicy, StoreConfig};
use crate::context::OpContext;
use crate::error::{Degraded, Result, StoreError};
use crate::identity::{RoomDirectory, SqliteDirectory, UserDirectory};
use crate::models::{DirectMessageRow, Message, RoomMessageRow};
use crate::schema::init_schema;
use crate::sqlite_pool::SqlitePoolManager;

/// Id written for an unresolved recipient or room under [`IdentityPolicy::Lenient`].
pub const SENTINEL_ID: i64 = 0;

const ADD_MESSAGE: &str = "INSERT INTO messages (user_id, receiver_id, chatroom_id, body, created_at) VALUES (?, NULL, ?, ?, ?)";
const ADD_DIRECT_MESSAGE: &str = "INSERT INTO messages (user_id, receiver_id, chatroom_id, body, created_at) VALUES (?, ?, ?, ?, ?)";
const GET_ALL_MESSAGES: &str = "SELECT id, sender, name, body, created_at FROM full_messages WHERE name = ? ORDER BY id DESC LIMIT ?";
const GET_NEWEST_MESSAGES: &str = "SELECT id, sender, name, body, created_at FROM full_messages WHERE id > ? AND name = ? ORDER BY id DESC LIMIT ?";
const GET_ALL_DIRECT_MESSAGES: &str = r#"
    SELECT id, sender, receiver, name, body, created_at FROM full_direct_messages
    WHERE (sender = ? AND receiver = ?) OR (sender = ? AND receiver = ?)
    ORDER BY id DESC LIMIT ?
"#;
const GET_NEWEST_DIRECT_MESSAGES: &str = r#"
    SELECT id, sender, receiver, name, body, created_at FROM full_direct_messages
    WHERE id > ? AND ((sender = ? AND receiver = ?) OR (sender = ? AND receiver = ?))
    ORDER BY id DESC LIMIT ?
"#;
const GET_MESSAGE_COUNT: &str = "SELECT COUNT(id) FROM full_messages WHERE name = ?";
const GET_USERNAME_FROM_MESSAGE_ID: &str = "SELECT users.username FROM messages INNER JOIN users ON users.id = messages.user_id WHERE messages.id = ?";
const DELETE_MESSAGE: &str = "DELETE FROM messages WHERE id = ?";

#[derive(Clone)]
pub struct MessageStore {
    pool_manager: SqlitePoolManager,
    users: Arc<dyn UserDirectory>,
    rooms: Arc<dyn RoomDirectory>,
    policy: IdentityPolicy,
}

impl MessageStore {
    /// Opens the database from `config`, creating the schema, and resolves
    /// identities through a [`SqliteDirectory`] on the same pool.
    pub async fn open(config: &StoreConfig) -> std::result::Result<Self, sqlx::Error> {
        let pool_manager =
            SqlitePoolManager::new(&config.database_url, config.max_connections).await?;
        let directory = Arc::new(SqliteDirectory::new(pool_manager.pool().clone()));

        Self::with_directories(
            pool_manager,
            directory.clone(),
            directory,
            config.identity_policy,
        )
        .await
    }

    /// Builds a store with injected identity collaborators.
    pub async fn with_directories(
        pool_manager: SqlitePoolManager,
        users: Arc<dyn UserDirectory>,
        rooms: Arc<dyn RoomDirectory>,
        policy: IdentityPolicy,
    ) -> std::result::Result<Self, sqlx::Error> {
        init_schema(pool_manager.pool()).await?;

        Ok(Self {
            pool_manager,
            users,
            rooms,
            policy,
        })
    }

    /// A directory over this store's database, for registering users and rooms.
    pub fn sqlite_directory(&self) -> SqliteDirectory {
        SqliteDirectory::new(self.pool_manager.pool().clone())
    }

    pub fn identity_policy(&self) -> IdentityPolicy {
        self.policy
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &sqlx::SqlitePool {
        self.pool_manager.pool()
    }

    /// Appends a room message and returns its id.
    #[instrument(skip(self, ctx, body))]
    pub async fn append_room_message(
        &self,
        ctx: &OpContext,
        body: &str,
        sender: &str,
        room: &str,
    ) -> Result<i64> {
        ctx.run(async {
            let sender_id = self.resolve_sender(sender).await?;
            let room_id = self.resolve_room(room).await?;

            let id = sqlx::query(ADD_MESSAGE)
                .bind(sender_id)
                .bind(room_id)
                .bind(body)
                .bind(Utc::now())
                .execute(self.pool_manager.pool())
                .await
                .map_err(StoreError::write)?
                .last_insert_rowid();

            info!(message_id = id, sender_id, room_id, "Saved room message");
            Ok::<_, StoreError>(id)
        })
        .await
    }

    /// Appends a direct message from `sender` to `recipient`, tagged with `room`.
    #[instrument(skip(self, ctx, body))]
    pub async fn append_direct_message(
        &self,
        ctx: &OpContext,
        body: &str,
        sender: &str,
        recipient: &str,
        room: &str,
    ) -> Result<i64> {
        ctx.run(async {
            let sender_id = self.resolve_sender(sender).await?;
            let recipient_id = self.resolve_recipient(recipient).await?;
            let room_id = self.resolve_room(room).await?;

            let id = sqlx::query(ADD_DIRECT_MESSAGE)
                .bind(sender_id)
                .bind(recipient_id)
                .bind(room_id)
                .bind(body)
                .bind(Utc::now())
                .execute(self.pool_manager.pool())
                .await
                .map_err(StoreError::write)?
                .last_insert_rowid();

            info!(
                message_id = id,
                sender_id, recipient_id, room_id, "Saved direct message"
            );
            Ok::<_, StoreError>(id)
        })
        .await
    }

    /// Up to `limit` most recent messages in `room`.
    #[instrument(skip(self, ctx))]
    pub async fn list_messages(
        &self,
        ctx: &OpContext,
        room: &str,
        limit: u32,
    ) -> Result<Vec<Message>> {
        ctx.run(async {
            if limit == 0 {
                return Ok(Vec::new());
            }

            let rows: Vec<RoomMessageRow> = sqlx::query_as(GET_ALL_MESSAGES)
                .bind(room)
                .bind(i64::from(limit))
                .fetch_all(self.pool_manager.pool())
                .await
                .map_err(StoreError::query)?;

            debug!(count = rows.len(), "Retrieved room messages");
            Ok::<_, StoreError>(rows.into_iter().map(Message::from).collect())
        })
        .await
    }

    /// Up to `limit` messages in `room` with id greater than `cursor`.
    #[instrument(skip(self, ctx))]
    pub async fn list_messages_since(
        &self,
        ctx: &OpContext,
        cursor: i64,
        room: &str,
        limit: u32,
    ) -> Result<Vec<Message>> {
        ctx.run(async {
            if limit == 0 {
                return Ok(Vec::new());
            }

            let rows: Vec<RoomMessageRow> = sqlx::query_as(GET_NEWEST_MESSAGES)
                .bind(cursor)
                .bind(room)
                .bind(i64::from(limit))
                .fetch_all(self.pool_manager.pool())
                .await
                .map_err(StoreError::query)?;

            debug!(count = rows.len(), "Retrieved newer room messages");
            Ok::<_, StoreError>(rows.into_iter().map(Message::from).collect())
        })
        .await
    }

    /// Conversation between `user_a` and `user_b` in both directions.
    /// The pair is unordered.
    #[instrument(skip(self, ctx))]
    pub async fn list_direct_messages(
        &self,
        ctx: &OpContext,
        user_a: &str,
        user_b: &str,
        limit: u32,
    ) -> Result<Vec<Message>> {
        ctx.run(async {
            if limit == 0 {
                return Ok(Vec::new());
            }

            let rows: Vec<DirectMessageRow> = sqlx::query_as(GET_ALL_DIRECT_MESSAGES)
                .bind(user_a)
                .bind(user_b)
                .bind(user_b)
                .bind(user_a)
                .bind(i64::from(limit))
                .fetch_all(self.pool_manager.pool())
                .await
                .map_err(StoreError::query)?;

            debug!(count = rows.len(), "Retrieved direct messages");
            Ok::<_, StoreError>(rows.into_iter().map(Message::from).collect())
        })
        .await
    }

    /// Like [`list_direct_messages`](Self::list_direct_messages), restricted to
    /// ids greater than `cursor`. A cursor of `0` means no lower bound.
    #[instrument(skip(self, ctx))]
    pub async fn list_direct_messages_since(
        &self,
        ctx: &OpContext,
        cursor: i64,
        user_a: &str,
        user_b: &str,
        limit: u32,
    ) -> Result<Vec<Message>> {
        ctx.run(async {
            if limit == 0 {
                return Ok(Vec::new());
            }

            let rows: Vec<DirectMessageRow> = sqlx::query_as(GET_NEWEST_DIRECT_MESSAGES)
                .bind(cursor)
                .bind(user_a)
                .bind(user_b)
                .bind(user_b)
                .bind(user_a)
                .bind(i64::from(limit))
                .fetch_all(self.pool_manager.pool())
                .await
                .map_err(StoreError::query)?;

            debug!(count = rows.len(), "Retrieved newer direct messages");
            Ok::<_, StoreError>(rows.into_iter().map(Message::from).collect())
        })
        .await
    }

    /// Number of room messages in `room`. Best effort: failures are logged and
    /// returned as [`Degraded`].
    #[instrument(skip(self, ctx))]
    pub async fn count_messages(
        &self,
        ctx: &OpContext,
        room: &str,
    ) -> std::result::Result<i64, Degraded> {
        ctx.run(async {
            let (count,): (i64,) = sqlx::query_as(GET_MESSAGE_COUNT)
                .bind(room)
                .fetch_one(self.pool_manager.pool())
                .await
                .map_err(StoreError::query)?;
            Ok::<_, StoreError>(count)
        })
        .await
        .map_err(|e| {
            warn!(room, error = %e, "Failed to count messages");
            Degraded::new("count_messages", e)
        })
    }

    /// Username of the author of `message_id`; `None` if no such message.
    /// Best effort like [`count_messages`](Self::count_messages).
    #[instrument(skip(self, ctx))]
    pub async fn resolve_author(
        &self,
        ctx: &OpContext,
        message_id: i64,
    ) -> std::result::Result<Option<String>, Degraded> {
        ctx.run(async {
            let row: Option<(String,)> = sqlx::query_as(GET_USERNAME_FROM_MESSAGE_ID)
                .bind(message_id)
                .fetch_optional(self.pool_manager.pool())
                .await
                .map_err(StoreError::query)?;
            Ok::<_, StoreError>(row.map(|r| r.0))
        })
        .await
        .map_err(|e| {
            warn!(message_id, error = %e, "Failed to resolve message author");
            Degraded::new("resolve_author", e)
        })
    }

    /// Deletes `message_id` and returns the number of rows removed (0 or 1).
    /// A missing id is not an error.
    #[instrument(skip(self, ctx))]
    pub async fn delete_message(&self, ctx: &OpContext, message_id: i64) -> Result<u64> {
        ctx.run(async {
            let result = sqlx::query(DELETE_MESSAGE)
                .bind(message_id)
                .execute(self.pool_manager.pool())
                .await
                .map_err(StoreError::write)?;

            info!(
                message_id,
                rows_affected = result.rows_affected(),
                "Deleted message"
            );
            Ok::<_, StoreError>(result.rows_affected())
        })
        .await
    }

    async fn resolve_sender(&self, username: &str) -> Result<i64> {
        match self.users.resolve_user_id(username).await {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(StoreError::IdentityResolution(format!(
                "Couldn't find anyone with the username {}",
                username
            ))),
            Err(e) => Err(StoreError::IdentityResolution(format!(
                "Failed to resolve user {}: {}",
                username, e
            ))),
        }
    }

    async fn resolve_recipient(&self, username: &str) -> Result<i64> {
        match self.users.resolve_user_id(username).await {
            Ok(Some(id)) => Ok(id),
            Ok(None) => self.on_miss("recipient", username),
            Err(e) => Err(StoreError::IdentityResolution(format!(
                "Failed to resolve recipient {}: {}",
                username, e
            ))),
        }
    }

    async fn resolve_room(&self, room: &str) -> Result<i64> {
        match self.rooms.resolve_room_id(room).await {
            Ok(Some(id)) => Ok(id),
            Ok(None) => self.on_miss("room", room),
            Err(e) => Err(StoreError::IdentityResolution(format!(
                "Failed to resolve room {}: {}",
                room, e
            ))),
        }
    }

    fn on_miss(&self, kind: &'static str, name: &str) -> Result<i64> {
        match self.policy {
            IdentityPolicy::Strict => Err(StoreError::IdentityResolution(format!(
                "Unknown {}: {}",
                kind, name
            ))),
            IdentityPolicy::Lenient => {
                warn!(kind, name, "Unresolved identity, storing sentinel id");
                Ok(SENTINEL_ID)
            }
        }
    }
}
