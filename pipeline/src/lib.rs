//! # pipeline
//!
//! The harvester's moving parts on top of storage and the collaborator traits:
//!
//! - [`ingestion`] – one fetch → dedup → extract → store cycle
//! - [`convergence`] – repeats cycles until nothing new arrives
//! - [`reporting`] – today's records, digest text, sends and stats
//! - [`scheduler`] – time-of-day task queue for the continuous mode
//! - [`harvester`] – assembly of the above from [`harvest_core::HarvestConfig`]

pub mod convergence;
pub mod error;
pub mod harvester;
pub mod ingestion;
pub mod reporting;
pub mod scheduler;
mod session;

pub use convergence::{ConvergenceLoop, ConvergenceReport, StopReason};
pub use error::{PipelineError, Result};
pub use harvester::{build_harvester, Harvester};
pub use ingestion::{CycleReport, IngestionPipeline, MessageOutcome};
pub use reporting::{compose_digest, format_stats, strip_non_bmp, Reporter, SendReport};
pub use scheduler::{
    run_schedule, run_schedule_with_clock, Clock, Schedule, ScheduledTask, SystemClock,
    TaskRunner,
};
pub use session::with_session;
