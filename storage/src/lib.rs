//! Storage crate: content-addressed persistence of harvested messages.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`fingerprint`] – SHA-256 identity of a raw message body
//! - [`normalizer`] – Turns extracted JSON values into storable strings
//! - [`models`] – MessageRecord, StructuredFields, MessageStats
//! - [`message_repo`] – MessageRepository (SQLite), the deduplication store
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod fingerprint;
mod message_repo;
mod models;
mod normalizer;
mod sqlite_pool;

#[cfg(test)]
mod message_repo_test;

pub use error::StorageError;
pub use fingerprint::fingerprint;
pub use message_repo::{InsertOutcome, MessageRepository};
pub use models::{Field, MessageRecord, MessageStats, StructuredFields};
pub use normalizer::{is_known_value, normalize_value};
pub use sqlite_pool::SqlitePoolManager;
