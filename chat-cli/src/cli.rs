//! CLI parser.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chatdb")]
#[command(about = "Chat message store CLI: post, read, sync, count, delete", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Abort the operation after this many milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Register a user (no-op if it exists).
    AddUser { username: String },
    /// Create a chatroom (no-op if it exists).
    AddRoom { name: String },
    /// Post a message to a room.
    Post {
        #[arg(short, long)]
        from: String,
        #[arg(short, long)]
        room: String,
        body: String,
    },
    /// Send a direct message.
    Dm {
        #[arg(short, long)]
        from: String,
        #[arg(short, long)]
        to: String,
        #[arg(short, long)]
        room: String,
        body: String,
    },
    /// Most recent messages in a room, newest first.
    List {
        room: String,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Room messages newer than the cursor.
    Since {
        cursor: i64,
        room: String,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Conversation between two users, newest first.
    DmList {
        user_a: String,
        user_b: String,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Conversation messages newer than the cursor.
    DmSince {
        cursor: i64,
        user_a: String,
        user_b: String,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Number of messages in a room.
    Count { room: String },
    /// Author of a message.
    Author { message_id: i64 },
    /// Delete a message.
    Delete { message_id: i64 },
}
