//! # harvest-core
//!
//! Shared pieces for the channel harvester: the [`Messenger`] collaborator trait, error types,
//! the immutable [`HarvestConfig`] and tracing initialization. Used by pipeline,
//! webdriver-messenger and harvest-cli.

pub mod config;
pub mod error;
pub mod logger;
pub mod messenger;

pub use config::{parse_schedule_times, ConvergenceConfig, HarvestConfig, ScheduleConfig};
pub use error::{HarvestError, Result};
pub use logger::init_tracing;
pub use messenger::{Messenger, SessionHandle, StepOutcome};
