//! Integration tests for [`storage::MessageRepository`].
//!
//! Uses file-backed SQLite databases in temp dirs so that several pools (standing in for
//! separate processes) and concurrent tasks hit the same store.

use storage::{fingerprint, InsertOutcome, MessageRecord, MessageRepository, StructuredFields};
use tempfile::TempDir;

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}/nested/messages.db", dir.path().display())
}

fn city_record(text: &str, city: &str) -> MessageRecord {
    MessageRecord::new(
        text.to_string(),
        "Source".to_string(),
        StructuredFields {
            city: Some(city.to_string()),
            ..StructuredFields::default()
        },
    )
}

/// **Test: Same raw text inserted through two independent pools.**
///
/// **Setup:** Two repositories opened on the same database file (missing parent dir is created).
/// **Action:** Insert identical raw text through each.
/// **Expected:** First insert wins, second reports `Duplicate`; exactly one record is stored.
#[tokio::test]
async fn test_idempotent_insert_across_pools() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);

    let first = MessageRepository::new(&url).await.expect("first pool");
    let second = MessageRepository::new(&url).await.expect("second pool");

    let text = "Event in Madrid, apply by 01/05/2025";
    assert!(first.insert(&city_record(text, "Madrid")).await.unwrap());
    assert_eq!(
        second
            .insert_outcome(&city_record(text, "Madrid"))
            .await
            .unwrap(),
        InsertOutcome::Duplicate
    );

    assert!(second.exists(&fingerprint(text)).await.unwrap());
    assert_eq!(first.query_today().await.unwrap().len(), 1);
}

/// **Test: Data survives reopening the store.**
///
/// **Setup:** Insert one record, drop the repository.
/// **Action:** Reopen the same file and re-run `initialize`.
/// **Expected:** The record is still there and the schema call is harmless.
#[tokio::test]
async fn test_reopen_keeps_records() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);

    {
        let repo = MessageRepository::new(&url).await.unwrap();
        repo.insert(&city_record("Workshop in Vienna, 3-7 June", "Vienna"))
            .await
            .unwrap();
    }

    let repo = MessageRepository::new(&url).await.unwrap();
    repo.initialize().await.unwrap();

    let records = repo.query_today().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fields.city.as_deref(), Some("Vienna"));
}

/// **Test: Concurrent inserts of the same fingerprint.**
///
/// **Setup:** One file database, eight tasks on a multi-threaded runtime.
/// **Action:** Every task inserts the same raw text at once.
/// **Expected:** Exactly one task sees `true`; the rest see `false` without errors.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_fingerprint_single_winner() {
    let dir = TempDir::new().unwrap();
    let repo = MessageRepository::new(&database_url(&dir)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.insert(&city_record("Race for the same opportunity", "Rome"))
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().expect("insert must not error") {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(repo.count_today().await.unwrap(), 1);
}

/// **Test: Concurrent inserts of different fingerprints.**
///
/// **Setup:** One file database.
/// **Action:** Six tasks each insert a distinct message concurrently.
/// **Expected:** All six succeed.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_fingerprints_all_stored() {
    let dir = TempDir::new().unwrap();
    let repo = MessageRepository::new(&database_url(&dir)).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..6 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.insert(&city_record(&format!("Opportunity number {}", i), "Oslo"))
                .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().expect("insert must not error"));
    }

    assert_eq!(repo.count_today().await.unwrap(), 6);
}

/// **Test: Two different messages that both extract to nothing.**
///
/// **Setup:** Empty store.
/// **Action:** Insert two distinct texts whose fields are all `None`.
/// **Expected:** Both rejected; store stays empty.
#[tokio::test]
async fn test_all_null_messages_leave_store_empty() {
    let dir = TempDir::new().unwrap();
    let repo = MessageRepository::new(&database_url(&dir)).await.unwrap();

    for text in ["Good morning everyone!", "Reminder: meeting at five"] {
        let record = MessageRecord::new(
            text.to_string(),
            "Source".to_string(),
            StructuredFields::default(),
        );
        assert_eq!(
            repo.insert_outcome(&record).await.unwrap(),
            InsertOutcome::Rejected
        );
    }

    assert!(repo.query_today().await.unwrap().is_empty());
}
