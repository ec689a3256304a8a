//! Hand-written collaborator doubles shared by the pipeline integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveTime;
use field_extractor::{FieldExtractor, RawFields};
use harvest_core::{
    ConvergenceConfig, HarvestConfig, HarvestError, Messenger, ScheduleConfig, SessionHandle,
    StepOutcome,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use storage::MessageRepository;

/// In-memory messenger. Serves scripted batches (the last one repeats) or, when `fresh`
/// is set, a new unique message on every fetch.
#[derive(Default)]
pub struct FakeMessenger {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub fail_open: bool,
    pub navigate_failure: Option<String>,
    pub fail_sends: bool,
    pub fresh: bool,
    pub batches: Mutex<VecDeque<Vec<String>>>,
    pub fetch_count: AtomicUsize,
    pub navigated: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<String>>,
}

impl FakeMessenger {
    pub fn with_batch(messages: &[&str]) -> Self {
        let messenger = Self::default();
        messenger.push_batch(messages);
        messenger
    }

    pub fn push_batch(&self, messages: &[&str]) {
        self.batches
            .lock()
            .unwrap()
            .push_back(messages.iter().map(|m| m.to_string()).collect());
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn navigated(&self) -> Vec<String> {
        self.navigated.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn open_session(&self) -> harvest_core::Result<SessionHandle> {
        if self.fail_open {
            return Err(HarvestError::Session("browser not reachable".to_string()));
        }
        let n = self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(SessionHandle::new(format!("fake-{}", n)))
    }

    async fn navigate_to_channel(&self, _session: &SessionHandle, channel: &str) -> StepOutcome {
        self.navigated.lock().unwrap().push(channel.to_string());
        match &self.navigate_failure {
            Some(reason) => StepOutcome::failed(reason.clone()),
            None => StepOutcome::Done,
        }
    }

    async fn fetch_visible_messages(&self, _session: &SessionHandle) -> Vec<String> {
        let n = self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.fresh {
            return vec![format!("Fresh opportunity number {} in Lisbon", n)];
        }
        let mut batches = self.batches.lock().unwrap();
        if batches.len() > 1 {
            batches.pop_front().unwrap_or_default()
        } else {
            batches.front().cloned().unwrap_or_default()
        }
    }

    async fn send_message(&self, _session: &SessionHandle, text: &str) -> StepOutcome {
        if self.fail_sends {
            return StepOutcome::failed("compose box not found");
        }
        self.sent.lock().unwrap().push(text.to_string());
        StepOutcome::Done
    }

    async fn close_session(&self, _session: SessionHandle) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Extractor answering from a fixed table. Unknown texts get `default`; texts containing
/// `PANIC` panic.
pub struct FakeExtractor {
    pub answers: HashMap<String, Value>,
    pub default: Value,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            default: serde_json::json!({}),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every text extracts to `value`.
    pub fn always(value: Value) -> Self {
        Self {
            default: value,
            ..Self::new()
        }
    }

    pub fn answer(mut self, text: &str, value: Value) -> Self {
        self.answers.insert(text.to_string(), value);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FieldExtractor for FakeExtractor {
    async fn extract(&self, raw_text: &str) -> RawFields {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if raw_text.contains("PANIC") {
            panic!("extractor blew up");
        }
        let value = self.answers.get(raw_text).unwrap_or(&self.default);
        value.as_object().cloned().unwrap_or_default()
    }
}

pub async fn memory_repo() -> MessageRepository {
    MessageRepository::new("sqlite::memory:")
        .await
        .expect("Failed to create repository")
}

pub fn test_config(database_url: &str) -> HarvestConfig {
    HarvestConfig {
        source_channel: "Source".to_string(),
        destination_channel: "Destination".to_string(),
        database_url: database_url.to_string(),
        log_file: "logs/test.log".to_string(),
        debug: false,
        send_pause: Duration::ZERO,
        schedule: ScheduleConfig {
            scrape_times: vec![NaiveTime::from_hms_opt(8, 0, 0).unwrap()],
            send_times: vec![NaiveTime::from_hms_opt(8, 10, 0).unwrap()],
            digest_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            poll_interval: Duration::from_secs(30),
        },
        convergence: ConvergenceConfig {
            max_attempts: 3,
            pause: Duration::ZERO,
        },
    }
}
