//! Environment-driven configuration
//!
//! Collaborator settings (endpoints, model names, keys) come from the
//! process environment. Required settings fail fast with
//! [`ToolingError::MissingEnv`](crate::ToolingError::MissingEnv) so a run
//! never starts with a half-configured model.
//!
//! ```rust,ignore
//! use tooling::config::{get_env_or, get_env_parse_or, require_env};
//!
//! let endpoint = require_env("AZURE_OPENAI_ENDPOINT")?;
//! let api_version = get_env_or("AZURE_OPENAI_API_VERSION", "2024-09-01-preview")?;
//! let temperature: f32 = get_env_parse_or("AZURE_OPENAI_TEMPERATURE", 0.0)?;
//! ```

mod env;

pub use env::{
    build_env_key, get_env, get_env_bool, get_env_or, get_env_parse, get_env_parse_or,
    require_env,
};
