use chrono::NaiveTime;
use std::env;
use std::time::Duration;

use super::harvest_config::parse_env_number;
use crate::error::{HarvestError, Result};

/// Times of day for the continuous mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// SCRAPE_TIMES, comma-separated `HH:MM`
    pub scrape_times: Vec<NaiveTime>,
    /// SEND_TIMES, comma-separated `HH:MM`
    pub send_times: Vec<NaiveTime>,
    /// DIGEST_TIME, single `HH:MM`
    pub digest_time: NaiveTime,
    /// SCHEDULER_POLL_SECS
    pub poll_interval: Duration,
}

impl ScheduleConfig {
    pub fn from_env() -> Result<Self> {
        let scrape_times = parse_schedule_times(
            &env::var("SCRAPE_TIMES").unwrap_or_else(|_| "08:00,13:00,17:00".to_string()),
        )?;
        let send_times = parse_schedule_times(
            &env::var("SEND_TIMES").unwrap_or_else(|_| "08:10,13:10,17:10".to_string()),
        )?;
        let digest_time = parse_time(
            &env::var("DIGEST_TIME").unwrap_or_else(|_| "20:00".to_string()),
        )?;
        let poll_interval = Duration::from_secs(parse_env_number("SCHEDULER_POLL_SECS", 30)?.max(1));

        Ok(Self {
            scrape_times,
            send_times,
            digest_time,
            poll_interval,
        })
    }
}

/// Parses a comma-separated list of `HH:MM` times. Blank entries are skipped.
pub fn parse_schedule_times(raw: &str) -> Result<Vec<NaiveTime>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_time)
        .collect()
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| HarvestError::Config(format!("Invalid time '{}': {}", raw.trim(), e)))
}
