//! Chat model providers for agentgraph.
//!
//! Concrete [`ChatModel`] implementations that agent nodes receive at
//! construction time. The engine itself never reaches a provider; it only
//! sees the trait.
//!
//! # Providers
//!
//! - [`OpenAiClient`] - OpenAI chat completions, or an Azure OpenAI
//!   deployment via [`OpenAiClient::azure`]
//! - [`RetryingChatModel`] - wraps any model and retries transient failures
//!
//! # Configuration
//!
//! [`from_env`] picks a provider from the environment and fails fast when
//! a required variable is missing:
//!
//! | variable | |
//! |---|---|
//! | `AZURE_OPENAI_ENDPOINT` | selects Azure when set |
//! | `AZURE_OPENAI_MODEL` | deployment name |
//! | `AZURE_OPENAI_KEY` | api key |
//! | `OPENAI_API_KEY` | used when no Azure endpoint is set |
//!
//! ```rust,ignore
//! let model = llm::from_env()?;
//! let reply = model.generate(vec![Message::user("Hello!")], &[]).await?;
//! ```

pub mod config;
pub mod error;
pub mod remote;
pub mod retry;

use std::sync::Arc;

pub use agentgraph_core::llm::{ChatConfig, ChatModel, ChatRequest, ChatResponse, ToolDefinition, UsageMetadata};
pub use config::{AzureOpenAiConfig, RemoteLlmConfig};
pub use error::{LlmError, Result};
pub use remote::OpenAiClient;
pub use retry::RetryingChatModel;

/// Provider selected from the environment, wrapped in retries.
///
/// Azure OpenAI when `AZURE_OPENAI_ENDPOINT` is set, OpenAI otherwise.
pub fn from_env() -> Result<Arc<dyn ChatModel>> {
    let (client, max_retries) = if tooling::config::get_env(config::AZURE_ENDPOINT_VAR)?.is_some() {
        let config = AzureOpenAiConfig::from_env()?;
        tracing::info!(deployment = %config.deployment, api_version = %config.api_version, "using Azure OpenAI");
        let retries = config.max_retries;
        (OpenAiClient::azure(config)?, retries)
    } else {
        let config = RemoteLlmConfig::from_env()?;
        tracing::info!(model = %config.model, base_url = %config.base_url, "using OpenAI");
        let retries = config.max_retries;
        (OpenAiClient::new(config)?, retries)
    };

    let policy = tooling::async_utils::RetryPolicy::new(max_retries);
    Ok(Arc::new(RetryingChatModel::new(Arc::new(client), policy)))
}
