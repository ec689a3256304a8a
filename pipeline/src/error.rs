//! Pipeline error types.
//!
//! Only collaborator-level and storage failures cross a cycle boundary; per-message
//! problems are logged and counted inside the cycle.

use harvest_core::HarvestError;
use storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Core(#[from] HarvestError),

    #[error("Channel '{channel}' unavailable: {reason}")]
    ChannelUnavailable { channel: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
