//! Table and view bootstrap.
//!
//! Reads go through the `full_messages` / `full_direct_messages` views, which
//! join sender, receiver and room ids back to their names.

use sqlx::SqlitePool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chatrooms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        receiver_id INTEGER,
        chatroom_id INTEGER NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_chatroom_id ON messages(chatroom_id, id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages(user_id, receiver_id, id)",
    r#"
    CREATE VIEW IF NOT EXISTS full_messages AS
    SELECT m.id AS id,
           u.username AS sender,
           c.name AS name,
           m.body AS body,
           m.created_at AS created_at
    FROM messages m
    INNER JOIN users u ON u.id = m.user_id
    INNER JOIN chatrooms c ON c.id = m.chatroom_id
    WHERE m.receiver_id IS NULL
    "#,
    r#"
    CREATE VIEW IF NOT EXISTS full_direct_messages AS
    SELECT m.id AS id,
           s.username AS sender,
           r.username AS receiver,
           c.name AS name,
           m.body AS body,
           m.created_at AS created_at
    FROM messages m
    INNER JOIN users s ON s.id = m.user_id
    INNER JOIN users r ON r.id = m.receiver_id
    INNER JOIN chatrooms c ON c.id = m.chatroom_id
    "#,
];

/// Creates tables, indexes and views if they do not exist.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Creating database tables if not exist");

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database tables created successfully");
    Ok(())
}
