use std::env;
use std::time::Duration;

use super::schedule::ScheduleConfig;
use crate::error::{HarvestError, Result};

/// Convergence loop policy: attempt budget and the fixed pause between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceConfig {
    pub max_attempts: u32,
    pub pause: Duration,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            pause: Duration::from_secs(3),
        }
    }
}

/// Immutable process-wide configuration.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// SOURCE_CHANNEL
    pub source_channel: String,
    /// DESTINATION_CHANNEL
    pub destination_channel: String,
    /// DATABASE_URL (sqlx SQLite URL, e.g. `sqlite://data/messages.db` or `sqlite::memory:`)
    pub database_url: String,
    /// LOG_FILE
    pub log_file: String,
    /// DEBUG
    pub debug: bool,
    /// Pause between individual sends (SEND_PAUSE_SECS)
    pub send_pause: Duration,
    pub schedule: ScheduleConfig,
    pub convergence: ConvergenceConfig,
}

impl HarvestConfig {
    /// Load from environment variables, falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let source_channel =
            env::var("SOURCE_CHANNEL").unwrap_or_else(|_| "SourceChannel".to_string());
        let destination_channel =
            env::var("DESTINATION_CHANNEL").unwrap_or_else(|_| "DestinationChannel".to_string());
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/messages.db".to_string());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/harvest.log".to_string());
        let debug = env::var("DEBUG")
            .map(|s| s.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let send_pause = Duration::from_secs(parse_env_number("SEND_PAUSE_SECS", 2)?);

        let schedule = ScheduleConfig::from_env()?;

        let max_attempts = parse_env_number("CONVERGENCE_MAX_ATTEMPTS", 3)?;
        let pause = Duration::from_secs(parse_env_number("CONVERGENCE_PAUSE_SECS", 3)?);
        let convergence = ConvergenceConfig {
            max_attempts: u32::try_from(max_attempts).map_err(|_| {
                HarvestError::Config(format!(
                    "CONVERGENCE_MAX_ATTEMPTS out of range: {}",
                    max_attempts
                ))
            })?,
            pause,
        };

        let config = Self {
            source_channel,
            destination_channel,
            database_url,
            log_file,
            debug,
            send_pause,
            schedule,
            convergence,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects configs that cannot drive a cycle (blank channel names, zero attempt budget).
    pub fn validate(&self) -> Result<()> {
        if self.source_channel.trim().is_empty() {
            return Err(HarvestError::Config("SOURCE_CHANNEL is empty".to_string()));
        }
        if self.destination_channel.trim().is_empty() {
            return Err(HarvestError::Config(
                "DESTINATION_CHANNEL is empty".to_string(),
            ));
        }
        if self.convergence.max_attempts == 0 {
            return Err(HarvestError::Config(
                "CONVERGENCE_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads a numeric env var; unset means `default`, set-but-invalid is a config error.
pub(crate) fn parse_env_number(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            HarvestError::Config(format!("{} is not a valid number: {}", key, raw))
        }),
        Err(_) => Ok(default),
    }
}
