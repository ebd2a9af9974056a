//! Row shapes of the `full_messages` and `full_direct_messages` views.

use chrono::{DateTime, Utc};

use super::Message;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RoomMessageRow {
    pub id: i64,
    pub sender: String,
    pub name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<RoomMessageRow> for Message {
    fn from(row: RoomMessageRow) -> Self {
        Self {
            id: row.id,
            sender_name: row.sender,
            recipient_name: None,
            room: row.name,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DirectMessageRow {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<DirectMessageRow> for Message {
    fn from(row: DirectMessageRow) -> Self {
        Self {
            id: row.id,
            sender_name: row.sender,
            recipient_name: Some(row.receiver),
            room: row.name,
            body: row.body,
            created_at: row.created_at,
        }
    }
}
