//! Convergence loop: repeat ingestion cycles until a cycle adds nothing new.
//!
//! Progress is measured by today's stored count before and after each cycle, so the
//! loop stops on zero net-new records, on the first failed cycle, or when the attempt
//! budget runs out. Attempts share nothing but the store.

use harvest_core::ConvergenceConfig;
use std::sync::Arc;
use storage::MessageRepository;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::ingestion::{CycleReport, IngestionPipeline};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The last attempt added no records.
    Converged,
    /// Every attempt added records; budget spent.
    BudgetExhausted,
    /// A cycle failed at collaborator level.
    CycleFailed(String),
}

#[derive(Debug, Clone)]
pub struct ConvergenceReport {
    pub attempts: u32,
    pub new_records: i64,
    pub stop: StopReason,
    pub cycles: Vec<CycleReport>,
}

impl ConvergenceReport {
    pub fn succeeded(&self) -> bool {
        !matches!(self.stop, StopReason::CycleFailed(_))
    }
}

pub struct ConvergenceLoop {
    pipeline: Arc<IngestionPipeline>,
    repo: MessageRepository,
    config: ConvergenceConfig,
}

impl ConvergenceLoop {
    pub fn new(
        pipeline: Arc<IngestionPipeline>,
        repo: MessageRepository,
        config: ConvergenceConfig,
    ) -> Self {
        Self {
            pipeline,
            repo,
            config,
        }
    }

    #[instrument(skip(self), fields(max_attempts = self.config.max_attempts))]
    pub async fn run(&self) -> Result<ConvergenceReport> {
        let mut before = self.repo.count_today().await?;
        let mut report = ConvergenceReport {
            attempts: 0,
            new_records: 0,
            stop: StopReason::BudgetExhausted,
            cycles: Vec::new(),
        };

        while report.attempts < self.config.max_attempts {
            report.attempts += 1;

            match self.pipeline.run_cycle().await {
                Ok(cycle) => report.cycles.push(cycle),
                Err(e) => {
                    warn!(attempt = report.attempts, error = %e, "Stopping: cycle failed");
                    report.stop = StopReason::CycleFailed(e.to_string());
                    return Ok(report);
                }
            }

            let after = self.repo.count_today().await?;
            let added = after - before;
            info!(attempt = report.attempts, added, total_today = after, "step: attempt finished");

            if added == 0 {
                report.stop = StopReason::Converged;
                return Ok(report);
            }
            report.new_records += added.max(0);
            before = after;

            if report.attempts < self.config.max_attempts {
                tokio::time::sleep(self.config.pause).await;
            }
        }

        info!(attempts = report.attempts, "Stopping: attempt budget exhausted");
        Ok(report)
    }
}
