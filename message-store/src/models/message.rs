//! Message model and batch envelope.
//!
//! Serialized with the field names chat clients already consume
//! (`messageId`, `username`, `receivedUsername`, `chatroom`, `message`, `timestamp`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned, strictly increasing; also the pagination cursor.
    #[serde(rename = "messageId")]
    pub id: i64,
    #[serde(rename = "username")]
    pub sender_name: String,
    /// Set only for direct messages.
    #[serde(
        rename = "receivedUsername",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub recipient_name: Option<String>,
    #[serde(rename = "chatroom")]
    pub room: String,
    #[serde(rename = "message")]
    pub body: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_direct(&self) -> bool {
        self.recipient_name.is_some()
    }
}

/// A newest-first batch as returned by the list operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    pub messages: Vec<Message>,
}

impl Messages {
    /// Highest id in the batch, i.e. the cursor to pass on the next poll.
    pub fn latest_id(&self) -> Option<i64> {
        self.messages.iter().map(|m| m.id).max()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Vec<Message>> for Messages {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}
