//! Ingestion pipeline: fetch → dedup check → extract → normalize → store.
//!
//! A cycle owns one automation session for its whole duration. Each fetched message is
//! processed in isolation; an error or panic on one message is logged and counted, and the
//! rest of the batch continues. Only collaborator-level failures (session, channel) and
//! schema setup abort the cycle.

use futures::FutureExt;
use harvest_core::{Messenger, StepOutcome};
use field_extractor::FieldExtractor;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use storage::{fingerprint, InsertOutcome, MessageRecord, MessageRepository, StructuredFields};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::session::with_session;

/// What happened to one fetched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Already stored (pre-check hit or lost an insert race).
    Duplicate,
    /// Extraction produced nothing usable.
    Discarded,
    Stored,
}

/// Counters for one ingestion cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub duplicates: usize,
    pub discarded: usize,
    pub failed: usize,
    pub stored: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: MessageOutcome) {
        match outcome {
            MessageOutcome::Duplicate => self.duplicates += 1,
            MessageOutcome::Discarded => self.discarded += 1,
            MessageOutcome::Stored => self.stored += 1,
        }
    }
}

pub struct IngestionPipeline {
    repo: MessageRepository,
    messenger: Arc<dyn Messenger>,
    extractor: Arc<dyn FieldExtractor>,
    source_channel: String,
}

impl IngestionPipeline {
    pub fn new(
        repo: MessageRepository,
        messenger: Arc<dyn Messenger>,
        extractor: Arc<dyn FieldExtractor>,
        source_channel: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            messenger,
            extractor,
            source_channel: source_channel.into(),
        }
    }

    pub fn source_channel(&self) -> &str {
        &self.source_channel
    }

    /// Runs one full cycle with a fresh session.
    #[instrument(skip(self), fields(channel = %self.source_channel))]
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.repo.initialize().await?;

        let report = with_session(self.messenger.as_ref(), |session| async move {
            info!(session = %session, "step: opening source channel");
            if let StepOutcome::Failed(reason) = self
                .messenger
                .navigate_to_channel(&session, &self.source_channel)
                .await
            {
                return Err(PipelineError::ChannelUnavailable {
                    channel: self.source_channel.clone(),
                    reason,
                });
            }

            let messages = self.messenger.fetch_visible_messages(&session).await;
            info!(count = messages.len(), "step: fetched visible messages");
            Ok(self.process_batch(&messages).await)
        })
        .await;

        match &report {
            Ok(report) => info!(
                fetched = report.fetched,
                stored = report.stored,
                duplicates = report.duplicates,
                discarded = report.discarded,
                failed = report.failed,
                "step: cycle finished"
            ),
            Err(e) => error!(error = %e, "step: cycle failed"),
        }
        report
    }

    /// Processes a batch in source order; never fails as a whole.
    pub async fn process_batch(&self, messages: &[String]) -> CycleReport {
        let mut report = CycleReport {
            fetched: messages.len(),
            ..CycleReport::default()
        };

        for raw_text in messages {
            let outcome = AssertUnwindSafe(self.process_message(raw_text))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(outcome)) => report.record(outcome),
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(error = %e, preview = %preview(raw_text), "Message processing failed");
                }
                Err(_) => {
                    report.failed += 1;
                    error!(preview = %preview(raw_text), "Message processing panicked");
                }
            }
        }

        report
    }

    /// Runs one message through dedup, extraction, normalization and insert.
    pub async fn process_message(&self, raw_text: &str) -> Result<MessageOutcome> {
        let identity = fingerprint(raw_text);
        if self.repo.exists(&identity).await? {
            debug!(fingerprint = %identity, "Already stored, skipping extraction");
            return Ok(MessageOutcome::Duplicate);
        }

        let raw_fields = self.extractor.extract(raw_text).await;
        let fields = StructuredFields::from_raw(&raw_fields);
        let record = MessageRecord::new(
            raw_text.to_string(),
            self.source_channel.clone(),
            fields,
        );

        let outcome = match self.repo.insert_outcome(&record).await? {
            InsertOutcome::Inserted => MessageOutcome::Stored,
            InsertOutcome::Duplicate => MessageOutcome::Duplicate,
            InsertOutcome::Rejected => MessageOutcome::Discarded,
        };
        debug!(fingerprint = %identity, ?outcome, "Message processed");
        Ok(outcome)
    }
}

fn preview(text: &str) -> String {
    text.chars().take(60).collect()
}
