//! Message record model for persistence.
//!
//! Maps to the `messages` table and is used by MessageRepository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StructuredFields;
use crate::fingerprint::fingerprint;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    /// SHA-256 of `raw_text`; unique key.
    pub fingerprint: String,
    pub raw_text: String,
    #[sqlx(flatten)]
    pub fields: StructuredFields,
    pub source_channel: String,
    /// Ingestion time, not the original send time.
    pub received_at: DateTime<Utc>,
}

impl MessageRecord {
    /// Creates a new record fingerprinted from `raw_text` and stamped with the current time.
    pub fn new(raw_text: String, source_channel: String, fields: StructuredFields) -> Self {
        Self {
            fingerprint: fingerprint(&raw_text),
            raw_text,
            fields,
            source_channel,
            received_at: Utc::now(),
        }
    }
}
