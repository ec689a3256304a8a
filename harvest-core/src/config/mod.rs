//! Harvester configuration: channels, storage, logging, schedule and convergence policy.
//!
//! Read once from the environment at startup and passed by reference afterwards.

mod harvest_config;
mod schedule;


pub use harvest_config::{ConvergenceConfig, HarvestConfig};
pub use schedule::{parse_schedule_times, ScheduleConfig};
