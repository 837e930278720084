//! Error types for chat providers.

use agentgraph_core::GraphError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failure before a status code was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or malformed provider settings
    #[error("Configuration error: {0}")]
    Config(#[from] tooling::ToolingError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Service unavailable ({status}): {body}")]
    ServiceUnavailable { status: u16, body: String },

    /// Any other non-success status
    #[error("Provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::RateLimited(_) | LlmError::ServiceUnavailable { .. } => true,
            _ => false,
        }
    }

    /// Map a non-success status and body to an error
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => LlmError::Authentication(body),
            429 => LlmError::RateLimited(body),
            500..=599 => LlmError::ServiceUnavailable { status, body },
            _ => LlmError::Provider { status, body },
        }
    }
}

impl From<LlmError> for GraphError {
    fn from(err: LlmError) -> Self {
        let message = tooling::logging::sanitize_for_logging(&err.to_string());
        if err.is_retryable() {
            GraphError::collaborator_retryable(message)
        } else {
            GraphError::collaborator(message)
        }
    }
}
