//! Unit tests for MessageStore identity resolution, store failures and cancellation.
//!
//! Directories are mockall mocks; messages go to an in-memory SQLite database.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::config::IdentityPolicy;
use crate::context::OpContext;
use crate::error::StoreError;
use crate::identity::{MockRoomDirectory, MockUserDirectory, UserDirectory};
use crate::message_store::{MessageStore, SENTINEL_ID};
use crate::sqlite_pool::SqlitePoolManager;

/// alice=1, bob=2; every other name is unknown.
fn known_users() -> MockUserDirectory {
    let mut users = MockUserDirectory::new();
    users.expect_resolve_user_id().returning(|name| match name {
        "alice" => Ok(Some(1)),
        "bob" => Ok(Some(2)),
        _ => Ok(None),
    });
    users
}

/// general=10; every other room is unknown.
fn known_rooms() -> MockRoomDirectory {
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_resolve_room_id().returning(|name| match name {
        "general" => Ok(Some(10)),
        _ => Ok(None),
    });
    rooms
}

async fn store_with(
    users: MockUserDirectory,
    rooms: MockRoomDirectory,
    policy: IdentityPolicy,
) -> MessageStore {
    let pool_manager = SqlitePoolManager::new("sqlite::memory:", 1)
        .await
        .expect("Failed to create pool");
    MessageStore::with_directories(pool_manager, Arc::new(users), Arc::new(rooms), policy)
        .await
        .expect("Failed to create store")
}

async fn raw_rows(store: &MessageStore) -> Vec<(i64, i64, Option<i64>, i64)> {
    sqlx::query_as("SELECT id, user_id, receiver_id, chatroom_id FROM messages ORDER BY id")
        .fetch_all(store.pool())
        .await
        .expect("Failed to read messages table")
}

#[tokio::test]
async fn test_append_room_message_writes_resolved_ids() {
    let store = store_with(known_users(), known_rooms(), IdentityPolicy::Strict).await;
    let ctx = OpContext::background();

    let id = store
        .append_room_message(&ctx, "hello", "alice", "general")
        .await
        .expect("Failed to append");

    assert_eq!(raw_rows(&store).await, vec![(id, 1, None, 10)]);
}

#[tokio::test]
async fn test_unknown_sender_fails_without_touching_rooms() {
    let mut rooms = MockRoomDirectory::new();
    rooms.expect_resolve_room_id().times(0);
    let store = store_with(known_users(), rooms, IdentityPolicy::Lenient).await;

    let res = store
        .append_room_message(&OpContext::background(), "hello", "mallory", "general")
        .await;

    assert!(matches!(res, Err(StoreError::IdentityResolution(_))));
    assert!(raw_rows(&store).await.is_empty());
}

#[tokio::test]
async fn test_sender_directory_error_is_identity_resolution() {
    let mut users = MockUserDirectory::new();
    users
        .expect_resolve_user_id()
        .returning(|_| Err(anyhow::anyhow!("directory unavailable")));
    let store = store_with(users, known_rooms(), IdentityPolicy::Lenient).await;

    let res = store
        .append_direct_message(&OpContext::background(), "hi", "alice", "bob", "general")
        .await;

    match res {
        Err(StoreError::IdentityResolution(msg)) => assert!(msg.contains("directory unavailable")),
        other => panic!("expected IdentityResolution, got {:?}", other),
    }
    assert!(raw_rows(&store).await.is_empty());
}

#[tokio::test]
async fn test_strict_policy_rejects_unknown_room() {
    let store = store_with(known_users(), known_rooms(), IdentityPolicy::Strict).await;

    let res = store
        .append_room_message(&OpContext::background(), "hello", "alice", "nowhere")
        .await;

    assert!(matches!(res, Err(StoreError::IdentityResolution(_))));
    assert!(raw_rows(&store).await.is_empty());
}

#[tokio::test]
async fn test_strict_policy_rejects_unknown_recipient() {
    let store = store_with(known_users(), known_rooms(), IdentityPolicy::Strict).await;

    let res = store
        .append_direct_message(&OpContext::background(), "hi", "alice", "ghost", "general")
        .await;

    assert!(matches!(res, Err(StoreError::IdentityResolution(_))));
    assert!(raw_rows(&store).await.is_empty());
}

#[tokio::test]
async fn test_lenient_policy_stores_sentinel_ids() {
    let store = store_with(known_users(), known_rooms(), IdentityPolicy::Lenient).await;
    let ctx = OpContext::background();

    let room_id = store
        .append_room_message(&ctx, "hello", "alice", "nowhere")
        .await
        .expect("Lenient append should succeed");
    let dm_id = store
        .append_direct_message(&ctx, "hi", "alice", "ghost", "general")
        .await
        .expect("Lenient append should succeed");

    assert_eq!(
        raw_rows(&store).await,
        vec![
            (room_id, 1, None, SENTINEL_ID),
            (dm_id, 1, Some(SENTINEL_ID), 10),
        ]
    );
}

#[tokio::test]
async fn test_room_directory_error_fails_even_when_lenient() {
    let mut rooms = MockRoomDirectory::new();
    rooms
        .expect_resolve_room_id()
        .returning(|_| Err(anyhow::anyhow!("rooms offline")));
    let store = store_with(known_users(), rooms, IdentityPolicy::Lenient).await;

    let res = store
        .append_room_message(&OpContext::background(), "hello", "alice", "general")
        .await;

    assert!(matches!(res, Err(StoreError::IdentityResolution(_))));
}

#[tokio::test]
async fn test_cancelled_append_writes_nothing() {
    let store = store_with(known_users(), known_rooms(), IdentityPolicy::Strict).await;
    let ctx = OpContext::background();
    ctx.cancel();

    let res = store.append_room_message(&ctx, "hello", "alice", "general").await;

    assert!(matches!(res, Err(StoreError::Cancelled)));
    assert!(raw_rows(&store).await.is_empty());
}

async fn break_schema(store: &MessageStore, statement: &str) {
    sqlx::query(statement)
        .execute(store.pool())
        .await
        .expect("Failed to alter schema");
}

#[tokio::test]
async fn test_failed_reads_are_query_errors() {
    let store = store_with(known_users(), known_rooms(), IdentityPolicy::Strict).await;
    let ctx = OpContext::background();
    store
        .append_room_message(&ctx, "hello", "alice", "general")
        .await
        .expect("Failed to append");

    break_schema(&store, "DROP VIEW full_messages").await;
    break_schema(&store, "DROP VIEW full_direct_messages").await;

    let res = store.list_messages(&ctx, "general", 10).await;
    assert!(matches!(res, Err(StoreError::Query(_))));

    let res = store.list_messages_since(&ctx, 0, "general", 10).await;
    assert!(matches!(res, Err(StoreError::Query(_))));

    let res = store.list_direct_messages(&ctx, "alice", "bob", 10).await;
    assert!(matches!(res, Err(StoreError::Query(_))));

    let res = store
        .list_direct_messages_since(&ctx, 0, "alice", "bob", 10)
        .await;
    assert!(matches!(res, Err(StoreError::Query(_))));
}

#[tokio::test]
async fn test_failed_count_degrades_to_zero() {
    let store = store_with(known_users(), known_rooms(), IdentityPolicy::Strict).await;
    let ctx = OpContext::background();
    store
        .append_room_message(&ctx, "hello", "alice", "general")
        .await
        .expect("Failed to append");

    break_schema(&store, "DROP VIEW full_messages").await;

    let degraded = store
        .count_messages(&ctx, "general")
        .await
        .expect_err("count should degrade");
    assert_eq!(degraded.operation, "count_messages");
    assert!(matches!(degraded.cause, StoreError::Query(_)));
    assert!(!degraded.is_cancelled());

    assert_eq!(store.count_messages(&ctx, "general").await.unwrap_or_default(), 0);
}

#[tokio::test]
async fn test_failed_author_lookup_degrades_to_none() {
    let store = store_with(known_users(), known_rooms(), IdentityPolicy::Strict).await;
    let ctx = OpContext::background();
    let id = store
        .append_room_message(&ctx, "hello", "alice", "general")
        .await
        .expect("Failed to append");

    break_schema(&store, "DROP TABLE users").await;

    let degraded = store
        .resolve_author(&ctx, id)
        .await
        .expect_err("author lookup should degrade");
    assert_eq!(degraded.operation, "resolve_author");
    assert!(matches!(degraded.cause, StoreError::Query(_)));

    assert_eq!(store.resolve_author(&ctx, id).await.unwrap_or_default(), None);
}

#[tokio::test]
async fn test_failed_writes_are_write_errors() {
    let store = store_with(known_users(), known_rooms(), IdentityPolicy::Strict).await;
    let ctx = OpContext::background();

    break_schema(&store, "DROP TABLE messages").await;

    let res = store.append_room_message(&ctx, "hello", "alice", "general").await;
    assert!(matches!(res, Err(StoreError::Write(_))));

    let res = store
        .append_direct_message(&ctx, "hi", "alice", "bob", "general")
        .await;
    assert!(matches!(res, Err(StoreError::Write(_))));

    let res = store.delete_message(&ctx, 1).await;
    assert!(matches!(res, Err(StoreError::Write(_))));
}

/// Signals when a lookup starts, then never answers.
struct StalledUsers {
    entered: Arc<Notify>,
}

#[async_trait]
impl UserDirectory for StalledUsers {
    async fn resolve_user_id(&self, _username: &str) -> anyhow::Result<Option<i64>> {
        self.entered.notify_one();
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_cancel_while_append_in_flight() {
    let entered = Arc::new(Notify::new());
    let pool_manager = SqlitePoolManager::new("sqlite::memory:", 1)
        .await
        .expect("Failed to create pool");
    let store = MessageStore::with_directories(
        pool_manager,
        Arc::new(StalledUsers {
            entered: entered.clone(),
        }),
        Arc::new(known_rooms()),
        IdentityPolicy::Strict,
    )
    .await
    .expect("Failed to create store");

    let ctx = OpContext::background();
    let handle = {
        let store = store.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            store
                .append_room_message(&ctx, "hello", "alice", "general")
                .await
        })
    };

    entered.notified().await;
    ctx.cancel();

    let res = handle.await.expect("task panicked");
    assert!(matches!(res, Err(StoreError::Cancelled)));
    assert!(raw_rows(&store).await.is_empty());
}
