//! Store error types.
//!
//! [`StoreError`] is returned by every operation that propagates failures;
//! [`Degraded`] is returned by the best-effort operations (message count,
//! author lookup) whose callers may fall back to a zero value.

use thiserror::Error;

/// Errors that can occur when using message store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required identity (sender, or recipient/room under the strict policy)
    /// could not be resolved, or the directory itself failed.
    #[error("Identity resolution error: {0}")]
    IdentityResolution(String),
    #[error("Write error: {0}")]
    Write(String),
    #[error("Query error: {0}")]
    Query(String),
    /// Aborted through the operation's cancellation token or deadline.
    #[error("Operation cancelled")]
    Cancelled,
}

impl StoreError {
    pub(crate) fn write(e: sqlx::Error) -> Self {
        StoreError::Write(e.to_string())
    }

    pub(crate) fn query(e: sqlx::Error) -> Self {
        StoreError::Query(e.to_string())
    }
}

/// Failure of a best-effort operation.
///
/// The value is not authoritative: a count of zero or a missing author after
/// `unwrap_or_default()` only means no answer was available right now.
#[derive(Error, Debug)]
#[error("{operation} degraded: {cause}")]
pub struct Degraded {
    pub operation: &'static str,
    #[source]
    pub cause: StoreError,
}

impl Degraded {
    pub(crate) fn new(operation: &'static str, cause: StoreError) -> Self {
        Self { operation, cause }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, StoreError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
