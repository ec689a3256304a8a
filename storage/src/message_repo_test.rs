//! Unit tests for MessageRepository.
//!
//! Covers insert outcomes, the validity gate, exists/get_by_fingerprint, today's query and purge.

use crate::message_repo::{InsertOutcome, MessageRepository};
use crate::models::{MessageRecord, StructuredFields};
use chrono::{Duration, Local, Utc};

async fn memory_repo() -> MessageRepository {
    MessageRepository::new("sqlite::memory:")
        .await
        .expect("Failed to create repository")
}

fn madrid_fields() -> StructuredFields {
    StructuredFields {
        city: Some("Madrid".to_string()),
        registration_deadline: Some("01/05/2025".to_string()),
        ..StructuredFields::default()
    }
}

fn record(text: &str, fields: StructuredFields) -> MessageRecord {
    MessageRecord::new(text.to_string(), "Source".to_string(), fields)
}

#[tokio::test]
async fn test_insert_then_duplicate() {
    let repo = memory_repo().await;
    let message = record("Event in Madrid, apply by 01/05/2025", madrid_fields());

    assert!(repo.insert(&message).await.expect("Failed to insert"));
    assert_eq!(
        repo.insert_outcome(&message).await.expect("Failed to insert"),
        InsertOutcome::Duplicate
    );
    assert!(!repo.insert(&message).await.expect("Failed to insert"));

    assert_eq!(repo.query_today().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_insert_rejects_unusable_fields() {
    let repo = memory_repo().await;
    let unknowns = StructuredFields {
        country: Some("unknown".to_string()),
        city: Some("UNKNOWN".to_string()),
        ..StructuredFields::default()
    };

    assert_eq!(
        repo.insert_outcome(&record("Nothing useful in here", unknowns))
            .await
            .unwrap(),
        InsertOutcome::Rejected
    );
    assert_eq!(
        repo.insert_outcome(&record("Also nothing useful", StructuredFields::default()))
            .await
            .unwrap(),
        InsertOutcome::Rejected
    );

    assert!(repo.query_today().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_exists_and_get_by_fingerprint() {
    let repo = memory_repo().await;
    let message = record("Training course in Lisbon", madrid_fields());

    assert!(!repo.exists(&message.fingerprint).await.unwrap());
    repo.insert(&message).await.unwrap();
    assert!(repo.exists(&message.fingerprint).await.unwrap());

    let stored = repo
        .get_by_fingerprint(&message.fingerprint)
        .await
        .unwrap()
        .expect("record should be stored");
    assert_eq!(stored.raw_text, "Training course in Lisbon");
    assert_eq!(stored.fields, madrid_fields());
    assert_eq!(stored.source_channel, "Source");

    assert!(repo.get_by_fingerprint("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_recomputes_stale_fingerprint() {
    let repo = memory_repo().await;
    let mut message = record("Exchange in Porto", madrid_fields());
    let expected = message.fingerprint.clone();
    message.fingerprint = "not-a-hash".to_string();

    assert!(repo.insert(&message).await.unwrap());
    assert!(repo.exists(&expected).await.unwrap());
    assert!(!repo.exists("not-a-hash").await.unwrap());
}

#[tokio::test]
async fn test_query_today_orders_and_filters_by_day() {
    let repo = memory_repo().await;
    let now = Utc::now();

    let mut older = record("Old opportunity from two days ago", madrid_fields());
    older.received_at = now - Duration::days(2);
    let mut first = record("First opportunity today", madrid_fields());
    first.received_at = now - Duration::milliseconds(10);
    let second = record("Second opportunity today", madrid_fields());

    // Insert out of order to check sorting by received_at.
    repo.insert(&second).await.unwrap();
    repo.insert(&older).await.unwrap();
    repo.insert(&first).await.unwrap();

    let today = repo.query_today().await.unwrap();
    let texts: Vec<&str> = today.iter().map(|r| r.raw_text.as_str()).collect();
    assert_eq!(texts, vec!["First opportunity today", "Second opportunity today"]);
    assert_eq!(repo.count_today().await.unwrap(), 2);

    let old_day = (now - Duration::days(2)).with_timezone(&Local).date_naive();
    let old = repo.query_day(old_day).await.unwrap();
    assert_eq!(old.len(), 1);
    assert_eq!(old[0].raw_text, "Old opportunity from two days ago");
}

#[tokio::test]
async fn test_get_stats_and_purge_all() {
    let repo = memory_repo().await;

    let empty = repo.get_stats().await.unwrap();
    assert_eq!(empty.total_messages, 0);
    assert!(empty.first_received.is_none());

    repo.insert(&record("Seminar in Berlin", madrid_fields())).await.unwrap();
    let mut other = record("Youth exchange in Riga", madrid_fields());
    other.source_channel = "Other".to_string();
    repo.insert(&other).await.unwrap();

    let stats = repo.get_stats().await.unwrap();
    assert_eq!(stats.total_messages, 2);
    assert_eq!(stats.today_messages, 2);
    assert_eq!(stats.source_channels, 2);
    assert!(stats.first_received.is_some());
    assert!(stats.first_received <= stats.last_received);

    assert_eq!(repo.purge_all().await.unwrap(), 2);
    assert_eq!(repo.count_today().await.unwrap(), 0);
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let repo = memory_repo().await;
    repo.insert(&record("Kept across initialize", madrid_fields()))
        .await
        .unwrap();

    repo.initialize().await.expect("second initialize");
    repo.initialize().await.expect("third initialize");

    assert_eq!(repo.count_today().await.unwrap(), 1);
}

#[tokio::test]
async fn test_object_field_survives_storage() {
    let repo = memory_repo().await;
    let contact = serde_json::json!({"email": "info@example.org", "phone": "+34 600 000 000"});
    let raw = serde_json::json!({"city": "Madrid", "contact": contact.clone()});
    let fields = StructuredFields::from_raw(raw.as_object().unwrap());
    let message = record("Contact the organisers in Madrid", fields);

    assert!(repo.insert(&message).await.unwrap());

    let stored = repo
        .get_by_fingerprint(&message.fingerprint)
        .await
        .unwrap()
        .expect("record should be stored");
    let parsed: serde_json::Value =
        serde_json::from_str(stored.fields.contact.as_deref().unwrap()).unwrap();
    assert_eq!(parsed, contact);
}
