//! # chat-cli
//!
//! Command-line surface over the message store: argument parsing, logging
//! setup and command execution.

pub mod cli;
pub mod commands;
pub mod logger;

pub use cli::{Cli, Commands};
pub use commands::execute;
pub use logger::init_tracing;
