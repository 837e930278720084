//! Prebuilt agent graphs

pub mod react;

pub use react::{create_react_agent, ReactAgentConfig, DEFAULT_MAX_ITERATIONS};
