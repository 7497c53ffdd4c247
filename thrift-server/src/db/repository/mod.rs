//! Repository Module
//!
//! CRUD and transition queries per table, as free functions over the pool.
//! Status-changing updates are written as guarded statements
//! (`UPDATE ... WHERE status = ?`) so duplicate invocations become no-ops,
//! and the two sides of the drop assignment are only ever written together
//! inside one transaction.

pub mod drop;
pub mod item;
pub mod order;
pub mod submission;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
