//! Component assembly: builds the pipeline, convergence loop and reporter from config.

use async_trait::async_trait;
use field_extractor::FieldExtractor;
use harvest_core::{HarvestConfig, Messenger};
use std::sync::Arc;
use storage::MessageRepository;
use tracing::{error, info, instrument, warn};

use crate::convergence::ConvergenceLoop;
use crate::error::Result;
use crate::ingestion::IngestionPipeline;
use crate::reporting::Reporter;
use crate::scheduler::{ScheduledTask, TaskRunner};

/// Everything the command surface and the scheduler drive.
pub struct Harvester {
    pub repo: MessageRepository,
    pub pipeline: Arc<IngestionPipeline>,
    pub convergence: ConvergenceLoop,
    pub reporter: Reporter,
}

impl Harvester {
    pub fn new(
        config: &HarvestConfig,
        repo: MessageRepository,
        messenger: Arc<dyn Messenger>,
        extractor: Arc<dyn FieldExtractor>,
    ) -> Self {
        let pipeline = Arc::new(IngestionPipeline::new(
            repo.clone(),
            messenger.clone(),
            extractor,
            config.source_channel.clone(),
        ));
        let convergence =
            ConvergenceLoop::new(pipeline.clone(), repo.clone(), config.convergence.clone());
        let reporter = Reporter::new(
            repo.clone(),
            messenger,
            config.destination_channel.clone(),
            config.send_pause,
        );

        Self {
            repo,
            pipeline,
            convergence,
            reporter,
        }
    }
}

#[async_trait]
impl TaskRunner for Harvester {
    async fn run_task(&self, task: ScheduledTask) {
        match task {
            ScheduledTask::Scrape => match self.pipeline.run_cycle().await {
                Ok(report) => info!(stored = report.stored, "Scheduled scrape done"),
                Err(e) => error!(error = %e, "Scheduled scrape failed"),
            },
            ScheduledTask::SendIndividual => match self.reporter.send_individual().await {
                Ok(report) if report.failed > 0 => {
                    warn!(sent = report.sent, failed = report.failed, "Scheduled send partially failed")
                }
                Ok(report) => info!(sent = report.sent, "Scheduled send done"),
                Err(e) => error!(error = %e, "Scheduled send failed"),
            },
            ScheduledTask::Digest => match self.reporter.send_digest().await {
                Ok(report) => info!(records = report.records, sent = report.sent, "Scheduled digest done"),
                Err(e) => error!(error = %e, "Scheduled digest failed"),
            },
        }
    }
}

/// Opens the store (which prepares the schema) and wires the collaborators together.
#[instrument(skip(config, messenger, extractor))]
pub async fn build_harvester(
    config: &HarvestConfig,
    messenger: Arc<dyn Messenger>,
    extractor: Arc<dyn FieldExtractor>,
) -> Result<Harvester> {
    let repo = MessageRepository::new(&config.database_url)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                database_url = %config.database_url,
                "Failed to initialize message storage"
            );
            e
        })?;
    info!(database_url = %config.database_url, "Message storage ready");

    Ok(Harvester::new(config, repo, messenger, extractor))
}
