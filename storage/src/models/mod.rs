mod message_record;
mod message_stats;
mod structured_fields;

pub use message_record::MessageRecord;
pub use message_stats::MessageStats;
pub use structured_fields::{Field, StructuredFields};
