//! Command execution against a [`MessageStore`].
//!
//! Each command returns the text to print: JSON for batch reads, a bare value otherwise.

use anyhow::{Context, Result};
use message_store::{MessageStore, Messages, OpContext};
use tracing::info;

use crate::cli::Commands;

pub async fn execute(
    command: Commands,
    store: &MessageStore,
    ctx: &OpContext,
    default_limit: u32,
) -> Result<String> {
    match command {
        Commands::AddUser { username } => {
            let id = store
                .sqlite_directory()
                .register_user(&username)
                .await
                .with_context(|| format!("Register user {}", username))?;
            Ok(id.to_string())
        }
        Commands::AddRoom { name } => {
            let id = store
                .sqlite_directory()
                .create_room(&name)
                .await
                .with_context(|| format!("Create room {}", name))?;
            Ok(id.to_string())
        }
        Commands::Post { from, room, body } => {
            let id = store
                .append_room_message(ctx, &body, &from, &room)
                .await
                .context("Append room message")?;
            Ok(id.to_string())
        }
        Commands::Dm {
            from,
            to,
            room,
            body,
        } => {
            let id = store
                .append_direct_message(ctx, &body, &from, &to, &room)
                .await
                .context("Append direct message")?;
            Ok(id.to_string())
        }
        Commands::List { room, limit } => {
            let messages = store
                .list_messages(ctx, &room, limit.unwrap_or(default_limit))
                .await
                .context("List room messages")?;
            render(messages.into())
        }
        Commands::Since {
            cursor,
            room,
            limit,
        } => {
            let messages = store
                .list_messages_since(ctx, cursor, &room, limit.unwrap_or(default_limit))
                .await
                .context("List newer room messages")?;
            render(messages.into())
        }
        Commands::DmList {
            user_a,
            user_b,
            limit,
        } => {
            let messages = store
                .list_direct_messages(ctx, &user_a, &user_b, limit.unwrap_or(default_limit))
                .await
                .context("List direct messages")?;
            render(messages.into())
        }
        Commands::DmSince {
            cursor,
            user_a,
            user_b,
            limit,
        } => {
            let messages = store
                .list_direct_messages_since(
                    ctx,
                    cursor,
                    &user_a,
                    &user_b,
                    limit.unwrap_or(default_limit),
                )
                .await
                .context("List newer direct messages")?;
            render(messages.into())
        }
        Commands::Count { room } => {
            // Best effort: a degraded count prints 0, the failure is already logged.
            let count = store.count_messages(ctx, &room).await.unwrap_or_default();
            Ok(count.to_string())
        }
        Commands::Author { message_id } => {
            let author = store
                .resolve_author(ctx, message_id)
                .await
                .unwrap_or_default()
                .unwrap_or_default();
            Ok(author)
        }
        Commands::Delete { message_id } => {
            let removed = store
                .delete_message(ctx, message_id)
                .await
                .context("Delete message")?;
            info!(message_id, removed, "Delete finished");
            Ok(removed.to_string())
        }
    }
}

fn render(batch: Messages) -> Result<String> {
    if batch.is_empty() {
        info!("No messages");
    } else {
        info!(
            count = batch.len(),
            latest_id = ?batch.latest_id(),
            "Fetched messages"
        );
    }
    serde_json::to_string_pretty(&batch).context("Serialize messages")
}
