//! Provider configuration.
//!
//! Settings are either built in code or read from the environment. The
//! `from_env` constructors fail fast: a missing key or endpoint is reported
//! before any graph runs.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tooling::config::{get_env_or, get_env_parse, get_env_parse_or, require_env};

pub const AZURE_ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_MODEL_VAR: &str = "AZURE_OPENAI_MODEL";
pub const AZURE_KEY_VAR: &str = "AZURE_OPENAI_KEY";
pub const AZURE_API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL_VAR: &str = "OPENAI_MODEL";

pub const DEFAULT_AZURE_API_VERSION: &str = "2024-09-01-preview";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// OpenAI-compatible endpoint authenticated with a bearer key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    pub api_key: String,

    /// e.g. `https://api.openai.com/v1`
    pub base_url: String,

    pub model: String,

    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Used when a request does not set its own temperature
    #[serde(default)]
    pub temperature: Option<f32>,

    pub organization: Option<String>,
}

impl RemoteLlmConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            temperature: None,
            organization: None,
        }
    }

    /// `OPENAI_API_KEY` (required), `OPENAI_BASE_URL`, `OPENAI_MODEL`
    pub fn from_env() -> Result<Self> {
        let api_key = require_env(OPENAI_KEY_VAR)?;
        let base_url = get_env_or(OPENAI_BASE_URL_VAR, DEFAULT_OPENAI_BASE_URL)?;
        let model = get_env_or(OPENAI_MODEL_VAR, DEFAULT_OPENAI_MODEL)?;
        Ok(Self::new(api_key, base_url, model))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

/// Azure OpenAI deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// Deployment name
    pub deployment: String,
    pub api_key: String,
    pub api_version: String,
    pub temperature: f32,
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl AzureOpenAiConfig {
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            temperature: 0.0,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
        }
    }

    /// Read `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_MODEL` and
    /// `AZURE_OPENAI_KEY`; all three are required.
    ///
    /// `AZURE_OPENAI_API_VERSION` and `AZURE_OPENAI_TEMPERATURE` are optional.
    pub fn from_env() -> Result<Self> {
        let endpoint = require_env(AZURE_ENDPOINT_VAR)?;
        let deployment = require_env(AZURE_MODEL_VAR)?;
        let api_key = require_env(AZURE_KEY_VAR)?;

        let mut config = Self::new(endpoint, deployment, api_key);
        config.api_version = get_env_or(AZURE_API_VERSION_VAR, DEFAULT_AZURE_API_VERSION)?;
        config.temperature = get_env_parse_or("AZURE_OPENAI_TEMPERATURE", 0.0)?;
        if let Some(secs) = get_env_parse::<u64>("AZURE_OPENAI_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Chat-completions URL of the deployment
    pub fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_retries() -> usize {
    3
}
