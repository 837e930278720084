//! Errors raised while assembling prebuilt agents

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrebuiltError>;

#[derive(Error, Debug)]
pub enum PrebuiltError {
    /// Agent settings that cannot produce a working graph
    #[error("Invalid agent configuration: {0}")]
    InvalidConfig(String),

    #[error("Graph error: {0}")]
    Graph(#[from] agentgraph_core::GraphError),
}
