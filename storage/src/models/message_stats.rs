//! Aggregate statistics for stored messages.
//!
//! Returned by MessageRepository::get_stats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageStats {
    pub total_messages: i64,
    pub today_messages: i64,
    pub source_channels: i64,
    pub first_received: Option<DateTime<Utc>>,
    pub last_received: Option<DateTime<Utc>>,
}
