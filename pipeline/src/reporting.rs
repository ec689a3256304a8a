//! Retrieval and reporting: today's records, the daily digest, individual sends and stats.

use chrono::{Local, NaiveDate};
use harvest_core::{Messenger, StepOutcome};
use std::sync::Arc;
use std::time::Duration;
use storage::{Field, MessageRecord, MessageRepository, MessageStats};
use tracing::{info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::session::with_session;

const DIVIDER: &str = "--------------------";
const NOT_SPECIFIED: &str = "Not specified";

/// Outcome of a send run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReport {
    /// Records available for today.
    pub records: usize,
    pub sent: usize,
    pub failed: usize,
}

impl SendReport {
    pub fn nothing_to_send(&self) -> bool {
        self.records == 0
    }
}

pub struct Reporter {
    repo: MessageRepository,
    messenger: Arc<dyn Messenger>,
    destination_channel: String,
    send_pause: Duration,
}

impl Reporter {
    pub fn new(
        repo: MessageRepository,
        messenger: Arc<dyn Messenger>,
        destination_channel: impl Into<String>,
        send_pause: Duration,
    ) -> Self {
        Self {
            repo,
            messenger,
            destination_channel: destination_channel.into(),
            send_pause,
        }
    }

    pub async fn today_records(&self) -> Result<Vec<MessageRecord>> {
        Ok(self.repo.query_today().await?)
    }

    pub async fn stats(&self) -> Result<MessageStats> {
        Ok(self.repo.get_stats().await?)
    }

    /// Sends each of today's raw messages on its own. No session is opened when there is nothing to send.
    #[instrument(skip(self), fields(channel = %self.destination_channel))]
    pub async fn send_individual(&self) -> Result<SendReport> {
        let records = self.today_records().await?;
        let mut report = SendReport {
            records: records.len(),
            ..SendReport::default()
        };
        if records.is_empty() {
            info!("No messages to send");
            return Ok(report);
        }

        let texts: Vec<String> = records.iter().map(|r| strip_non_bmp(&r.raw_text)).collect();
        let (sent, failed) = self.deliver(&texts).await?;
        report.sent = sent;
        report.failed = failed;
        info!(sent, failed, "step: individual send finished");
        Ok(report)
    }

    /// Composes today's digest and sends it as one message.
    #[instrument(skip(self), fields(channel = %self.destination_channel))]
    pub async fn send_digest(&self) -> Result<SendReport> {
        let records = self.today_records().await?;
        let mut report = SendReport {
            records: records.len(),
            ..SendReport::default()
        };
        if records.is_empty() {
            info!("No messages today, digest skipped");
            return Ok(report);
        }

        let digest = strip_non_bmp(&compose_digest(&records, Local::now().date_naive()));
        let (sent, failed) = self.deliver(&[digest]).await?;
        report.sent = sent;
        report.failed = failed;
        info!(records = records.len(), sent, "step: digest send finished");
        Ok(report)
    }

    /// Opens the destination once and sends `texts` in order with a fixed pause between them.
    async fn deliver(&self, texts: &[String]) -> Result<(usize, usize)> {
        with_session(self.messenger.as_ref(), |session| async move {
            if let StepOutcome::Failed(reason) = self
                .messenger
                .navigate_to_channel(&session, &self.destination_channel)
                .await
            {
                return Err(PipelineError::ChannelUnavailable {
                    channel: self.destination_channel.clone(),
                    reason,
                });
            }

            let mut sent = 0;
            let mut failed = 0;
            for (i, text) in texts.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(self.send_pause).await;
                }
                match self.messenger.send_message(&session, text).await {
                    StepOutcome::Done => sent += 1,
                    StepOutcome::Failed(reason) => {
                        failed += 1;
                        warn!(reason = %reason, "Send failed");
                    }
                }
            }
            Ok((sent, failed))
        })
        .await
    }
}

fn label(field: Field) -> &'static str {
    match field {
        Field::Country => "Country",
        Field::City => "City",
        Field::StartDate => "Start date",
        Field::EndDate => "End date",
        Field::RegistrationDeadline => "Deadline",
        Field::Topic => "Topic",
        Field::InfoPack => "Info pack",
        Field::Form => "Form",
        Field::Contact => "Contact",
    }
}

/// Info pack, form and contact are left out when absent instead of printing a fallback.
fn omitted_when_absent(field: Field) -> bool {
    matches!(field, Field::InfoPack | Field::Form | Field::Contact)
}

/// Builds the digest text for `records` (already in display order).
pub fn compose_digest(records: &[MessageRecord], date: NaiveDate) -> String {
    let mut lines = vec![
        "*DAILY OPPORTUNITIES DIGEST*".to_string(),
        format!("Date: {}", date.format("%d/%m/%Y")),
        format!("Total: {}", records.len()),
        String::new(),
    ];

    for (i, record) in records.iter().enumerate() {
        lines.push(format!("OPPORTUNITY {}", i + 1));
        for (field, value) in record.fields.iter() {
            match value {
                Some(value) => lines.push(format!("- {}: {}", label(field), value)),
                None if omitted_when_absent(field) => {}
                None => lines.push(format!("- {}: {}", label(field), NOT_SPECIFIED)),
            }
        }
        lines.push(DIVIDER.to_string());
        lines.push(String::new());
    }

    lines.push("Generated automatically by the bot.".to_string());
    lines.join("\n")
}

/// Drops characters outside the Basic Multilingual Plane (emoji and other astral symbols).
pub fn strip_non_bmp(text: &str) -> String {
    text.chars().filter(|c| (*c as u32) <= 0xFFFF).collect()
}

/// Human-readable listing of today's records plus aggregate stats.
pub fn format_stats(records: &[MessageRecord], stats: &MessageStats) -> String {
    let mut lines = vec![format!("Messages stored today: {}", records.len())];

    for (i, record) in records.iter().enumerate() {
        let place = record
            .fields
            .country
            .as_deref()
            .or(record.fields.city.as_deref())
            .unwrap_or("No location");
        let snippet: String = record.raw_text.chars().take(60).collect::<String>().replace('\n', " ");
        lines.push(format!(
            "{}. [{}] {} - {}...",
            i + 1,
            record.received_at.with_timezone(&Local).format("%H:%M:%S"),
            place,
            snippet
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Total stored: {} from {} channel(s)",
        stats.total_messages, stats.source_channels
    ));
    if let (Some(first), Some(last)) = (stats.first_received, stats.last_received) {
        lines.push(format!(
            "First: {}  Last: {}",
            first.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            last.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ));
    }
    lines.join("\n")
}
