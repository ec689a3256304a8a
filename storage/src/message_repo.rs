//! Message repository: the deduplication store.
//!
//! One append-only `messages` table keyed by a UNIQUE fingerprint column. The unique
//! constraint is what keeps concurrent ingestion cycles from storing a message twice;
//! [`MessageRepository::exists`] only lets callers skip extraction early.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::fingerprint::fingerprint;
use crate::models::{MessageRecord, MessageStats};
use crate::sqlite_pool::SqlitePoolManager;

const SELECT_RECORD: &str = r#"
    SELECT fingerprint, raw_text, country, city, start_date, end_date,
           registration_deadline, topic, info_pack, form, contact,
           source_channel, received_at
    FROM messages
"#;

/// What happened to an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same fingerprint is already stored.
    Duplicate,
    /// Every structured field is empty or `unknown`; nothing was written.
    Rejected,
}

#[derive(Clone)]
pub struct MessageRepository {
    pool_manager: SqlitePoolManager,
}

impl MessageRepository {
    /// Connects and ensures the schema exists.
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let repo = Self { pool_manager };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Creates the table and indexes if missing. Safe to call on every run.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        debug!("Ensuring messages table exists");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fingerprint TEXT NOT NULL UNIQUE,
                raw_text TEXT NOT NULL,
                country TEXT,
                city TEXT,
                start_date TEXT,
                end_date TEXT,
                registration_deadline TEXT,
                topic TEXT,
                info_pack TEXT,
                form TEXT,
                contact TEXT,
                source_channel TEXT NOT NULL,
                received_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_received_at ON messages(received_at);
            CREATE INDEX IF NOT EXISTS idx_messages_source_channel ON messages(source_channel);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// True iff a record with this fingerprint is stored.
    pub async fn exists(&self, fingerprint: &str) -> Result<bool, StorageError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM messages WHERE fingerprint = ? LIMIT 1")
            .bind(fingerprint)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(row.is_some())
    }

    /// Inserts the record; `Ok(false)` for duplicates and records that fail the validity gate.
    pub async fn insert(&self, record: &MessageRecord) -> Result<bool, StorageError> {
        Ok(self.insert_outcome(record).await? == InsertOutcome::Inserted)
    }

    /// Inserts the record and reports why it was or was not stored.
    ///
    /// The identity is derived from `raw_text` here, so a record carrying a stale
    /// fingerprint still lands under the right key.
    pub async fn insert_outcome(&self, record: &MessageRecord) -> Result<InsertOutcome, StorageError> {
        if !record.fields.is_usable() {
            debug!(
                fingerprint = %record.fingerprint,
                "Discarding record: every field is empty or unknown"
            );
            return Ok(InsertOutcome::Rejected);
        }

        let identity = fingerprint(&record.raw_text);
        if identity != record.fingerprint {
            warn!(
                given = %record.fingerprint,
                computed = %identity,
                "Record fingerprint does not match its raw text; using computed value"
            );
        }

        let fields = &record.fields;
        let result = sqlx::query(
            r#"
            INSERT INTO messages (
                fingerprint, raw_text, country, city, start_date, end_date,
                registration_deadline, topic, info_pack, form, contact,
                source_channel, received_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&identity)
        .bind(&record.raw_text)
        .bind(&fields.country)
        .bind(&fields.city)
        .bind(&fields.start_date)
        .bind(&fields.end_date)
        .bind(&fields.registration_deadline)
        .bind(&fields.topic)
        .bind(&fields.info_pack)
        .bind(&fields.form)
        .bind(&fields.contact)
        .bind(&record.source_channel)
        .bind(record.received_at)
        .execute(self.pool_manager.pool())
        .await;

        match result {
            Ok(_) => {
                info!(fingerprint = %identity, channel = %record.source_channel, "Stored message");
                Ok(InsertOutcome::Inserted)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(fingerprint = %identity, "Duplicate message ignored");
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<MessageRecord>, StorageError> {
        let sql = format!("{} WHERE fingerprint = ?", SELECT_RECORD);
        let record = sqlx::query_as::<_, MessageRecord>(&sql)
            .bind(fingerprint)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(record)
    }

    /// Records received on the current local calendar day, oldest first.
    pub async fn query_today(&self) -> Result<Vec<MessageRecord>, StorageError> {
        self.query_day(Local::now().date_naive()).await
    }

    /// Records received on `date` (local calendar day), oldest first.
    pub async fn query_day(&self, date: NaiveDate) -> Result<Vec<MessageRecord>, StorageError> {
        let (start, end) = local_day_bounds(date);
        let sql = format!(
            "{} WHERE received_at >= ? AND received_at < ? ORDER BY received_at ASC, id ASC",
            SELECT_RECORD
        );

        let records = sqlx::query_as::<_, MessageRecord>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(self.pool_manager.pool())
            .await?;

        debug!(date = %date, count = records.len(), "Loaded records for day");
        Ok(records)
    }

    pub async fn count_today(&self) -> Result<i64, StorageError> {
        let (start, end) = local_day_bounds(Local::now().date_naive());
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE received_at >= ? AND received_at < ?")
                .bind(start)
                .bind(end)
                .fetch_one(self.pool_manager.pool())
                .await?;
        Ok(count.0)
    }

    pub async fn get_stats(&self) -> Result<MessageStats, StorageError> {
        let pool = self.pool_manager.pool();

        let total_messages: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(pool)
            .await?;

        let source_channels: (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT source_channel) FROM messages")
                .fetch_one(pool)
                .await?;

        let bounds: (Option<DateTime<Utc>>, Option<DateTime<Utc>>) =
            sqlx::query_as("SELECT MIN(received_at), MAX(received_at) FROM messages")
                .fetch_one(pool)
                .await?;

        let today_messages = self.count_today().await?;

        Ok(MessageStats {
            total_messages: total_messages.0,
            today_messages,
            source_channels: source_channels.0,
            first_received: bounds.0,
            last_received: bounds.1,
        })
    }

    /// Deletes every stored record. Callers are responsible for confirming first.
    pub async fn purge_all(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM messages")
            .execute(self.pool_manager.pool())
            .await?;

        warn!(deleted = result.rows_affected(), "Purged all stored messages");
        Ok(result.rows_affected())
    }
}

/// UTC bounds `[start, end)` of a local calendar day.
fn local_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.succ_opt().unwrap_or(NaiveDate::MAX);
    (local_midnight_utc(date), local_midnight_utc(next))
}

fn local_midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    first_valid_instant(date.and_time(NaiveTime::MIN), |local| {
        Local
            .from_local_datetime(local)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    })
}

/// First instant at or after `start` that exists in the local zone. Midnight can fall in a
/// DST gap; the day then starts when the clocks jump forward.
fn first_valid_instant<F>(start: NaiveDateTime, resolve: F) -> DateTime<Utc>
where
    F: Fn(&NaiveDateTime) -> Option<DateTime<Utc>>,
{
    (0..=24 * 60)
        .map(|minutes| start + chrono::Duration::minutes(minutes))
        .find_map(|local| resolve(&local))
        .unwrap_or_else(|| Utc.from_utc_datetime(&start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_valid_instant_skips_dst_gap() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
        let start = date.and_time(NaiveTime::MIN);
        let gap_end = date.and_hms_opt(1, 0, 0).unwrap();

        // Zone two hours ahead of UTC whose local clocks skip 00:00..01:00.
        let resolved = first_valid_instant(start, |local| {
            (*local >= gap_end).then(|| Utc.from_utc_datetime(&(*local - chrono::Duration::hours(2))))
        });

        assert_eq!(resolved, Utc.from_utc_datetime(&(gap_end - chrono::Duration::hours(2))));
    }

    #[test]
    fn test_first_valid_instant_regular_midnight() {
        let start = NaiveDate::from_ymd_opt(2025, 4, 20).unwrap().and_time(NaiveTime::MIN);

        let resolved = first_valid_instant(start, |local| Some(Utc.from_utc_datetime(local)));

        assert_eq!(resolved, Utc.from_utc_datetime(&start));
    }
}
