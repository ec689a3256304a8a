//! Storage error types.
//!
//! Used by MessageRepository and callers of storage APIs. Unique-constraint violations are
//! not errors; they surface as [`crate::InsertOutcome::Duplicate`].

use thiserror::Error;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
