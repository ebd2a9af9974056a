//! Shared setup for message-store integration tests.

#![allow(dead_code)]

use message_store::{MessageStore, OpContext, StoreConfig};

/// Fresh in-memory store with users alice, bob, carol and rooms general, random, dm-1.
pub async fn seeded_store() -> MessageStore {
    let store = MessageStore::open(&StoreConfig::in_memory())
        .await
        .expect("Failed to create store");

    let directory = store.sqlite_directory();
    for user in ["alice", "bob", "carol"] {
        directory
            .register_user(user)
            .await
            .expect("Failed to register user");
    }
    for room in ["general", "random", "dm-1"] {
        directory
            .create_room(room)
            .await
            .expect("Failed to create room");
    }

    store
}

pub fn ctx() -> OpContext {
    OpContext::background()
}

pub fn ids(messages: &[message_store::Message]) -> Vec<i64> {
    messages.iter().map(|m| m.id).collect()
}

pub fn bodies(messages: &[message_store::Message]) -> Vec<&str> {
    messages.iter().map(|m| m.body.as_str()).collect()
}
