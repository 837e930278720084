//! Checkpoint store failures

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckpointError>;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored document that does not parse as a checkpoint
    #[error("Corrupt checkpoint at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The finished write could not be moved into place
    #[error("Failed to commit checkpoint to {}: {reason}", path.display())]
    Commit { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
