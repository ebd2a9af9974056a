//! Message models returned by the store.

mod message;
mod rows;

pub use message::{Message, Messages};
pub(crate) use rows::{DirectMessageRow, RoomMessageRow};
