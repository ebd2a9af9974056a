//! Message store crate: persistence and cursor-based retrieval of chat messages.
//!
//! ## Modules
//!
//! - [`error`] – StoreError and Degraded
//! - [`config`] – StoreConfig, IdentityPolicy
//! - [`context`] – OpContext (cancellation and deadline per operation)
//! - [`identity`] – UserDirectory / RoomDirectory collaborators, SqliteDirectory
//! - [`models`] – Message, Messages
//! - [`message_store`] – MessageStore (SQLite)
//! - [`sqlite_pool`] – SqlitePoolManager

mod config;
mod context;
mod error;
mod identity;
mod message_store;
mod models;
mod schema;
mod sqlite_pool;

#[cfg(test)]
mod message_store_test;

pub use config::{IdentityPolicy, StoreConfig};
pub use context::OpContext;
pub use error::{Degraded, Result, StoreError};
pub use identity::{RoomDirectory, SqliteDirectory, UserDirectory};
pub use message_store::{MessageStore, SENTINEL_ID};
pub use models::{Message, Messages};
pub use sqlite_pool::SqlitePoolManager;
pub use tokio_util::sync::CancellationToken;
