//! chatdb CLI: operate a chat message database. Config from env (.env supported).

use std::time::Duration;

use anyhow::{Context, Result};
use chat_cli::{execute, init_tracing, Cli};
use clap::Parser;
use message_store::{MessageStore, OpContext, StoreConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_file = std::env::var("LOG_FILE").ok();
    init_tracing(log_file.as_deref())?;

    let config = StoreConfig::from_env().context("Load store config from env")?;
    let store = MessageStore::open(&config)
        .await
        .with_context(|| format!("Open database {}", config.database_url))?;

    let mut ctx = OpContext::background();
    if let Some(ms) = cli.timeout_ms {
        ctx = ctx.with_timeout(Duration::from_millis(ms));
    }

    let output = execute(cli.command, &store, &ctx, config.default_limit).await?;
    println!("{}", output);

    Ok(())
}
