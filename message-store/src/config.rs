//! Store configuration loaded from environment variables.
//!
//! DATABASE_URL, CHAT_IDENTITY_POLICY, CHAT_DEFAULT_LIMIT, CHAT_MAX_CONNECTIONS.

use anyhow::Result;
use std::env;
use std::str::FromStr;

/// What to do when a recipient or room name does not resolve.
///
/// An unknown sender is always an error regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityPolicy {
    /// Fail with `IdentityResolution`; nothing is written.
    #[default]
    Strict,
    /// Store the sentinel id `0` and log a warning.
    Lenient,
}

impl FromStr for IdentityPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(IdentityPolicy::Strict),
            "lenient" => Ok(IdentityPolicy::Lenient),
            other => anyhow::bail!("Unknown identity policy: {}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub identity_policy: IdentityPolicy,
    /// Batch size callers should use when they have no preference.
    pub default_limit: u32,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "file:./chat.db".to_string(),
            identity_policy: IdentityPolicy::Strict,
            default_limit: 50,
            max_connections: 5,
        }
    }
}

impl StoreConfig {
    /// Loads from the environment; every variable is optional.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let identity_policy = match env::var("CHAT_IDENTITY_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.identity_policy,
        };
        let default_limit = env::var("CHAT_DEFAULT_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.default_limit);
        let max_connections = env::var("CHAT_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_connections);

        Ok(Self {
            database_url,
            identity_policy,
            default_limit,
            max_connections,
        })
    }

    /// In-memory configuration, mainly for tests.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: IdentityPolicy) -> Self {
        self.identity_policy = policy;
        self
    }
}
