//! Shared helpers for the agentgraph workspace
//!
//! # Modules
//!
//! - `config` - environment variable loading for collaborator settings
//! - `async_utils` - retry policies with exponential backoff
//! - `logging` - timing and redaction helpers for structured logs

pub mod async_utils;
pub mod config;
pub mod logging;

use thiserror::Error;

/// Errors raised by the tooling helpers
#[derive(Debug, Error)]
pub enum ToolingError {
    /// A required environment variable is not set
    #[error("Missing required environment variable: {key}")]
    MissingEnv { key: String },

    /// An environment variable is set but unusable
    #[error("Invalid value for environment variable {key}: {reason}")]
    InvalidEnv { key: String, reason: String },

    #[error("Tooling error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, ToolingError>;

/// Crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
