//! Error types for graph construction and execution
//!
//! Every failure the engine can report is a [`GraphError`]. The first seven
//! variants form the engine's error taxonomy; each one is fatal to the run
//! that raised it. Tool failures are deliberately absent: the tool adapter
//! turns them into tool-result messages instead.
//!
//! # Error Hierarchy
//!
//! ```text
//! GraphError
//! ├── UnknownNode         - name not present in the node registry
//! ├── DuplicateNode       - node registered twice
//! ├── Routing             - decision produced an unmapped label
//! ├── UnknownTool         - tool call names an unregistered tool
//! ├── InvalidMerge        - partial update is not a mapping
//! ├── StepBudgetExceeded  - run executed too many nodes
//! ├── Collaborator        - LLM call failed
//! ├── Validation          - malformed graph structure
//! ├── NodeExecution       - node function reported a failure
//! ├── Timeout             - node exceeded its time limit
//! ├── Checkpoint          - persistence failure
//! ├── Serialization       - JSON conversion failure
//! └── Run                 - any of the above, tagged with node and step
//! ```
//!
//! # Matching through run context
//!
//! Errors escaping a run are wrapped in [`GraphError::Run`]. Use
//! [`GraphError::root`] to inspect the underlying cause:
//!
//! ```rust
//! use agentgraph_core::error::GraphError;
//!
//! fn describe(err: &GraphError) -> String {
//!     match err.root() {
//!         GraphError::Routing { label, .. } => format!("no branch for {label}"),
//!         GraphError::StepBudgetExceeded { limit } => format!("ran past {limit} steps"),
//!         other => other.to_string(),
//!     }
//! }
//! ```

use agentgraph_checkpoint::CheckpointError;
use thiserror::Error;

/// Result type alias for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur during graph construction and execution
#[derive(Error, Debug)]
pub enum GraphError {
    /// Name not found in the applicable node registry
    #[error("Unknown node: '{node}'")]
    UnknownNode { node: String },

    /// A node with this name is already registered
    #[error("Duplicate node: '{node}' is already registered")]
    DuplicateNode { node: String },

    /// Routing could not resolve the next node
    #[error("Routing error after '{node}': label '{label}' is not mapped to any node")]
    Routing { node: String, label: String },

    /// Tool call references an unregistered tool
    #[error("Unknown tool: '{tool}'")]
    UnknownTool { tool: String },

    /// Partial update could not be merged into the state
    #[error("Invalid merge: {0}")]
    InvalidMerge(String),

    /// The run executed more nodes than its budget allows
    #[error("Step budget exceeded: limit of {limit} node executions reached")]
    StepBudgetExceeded { limit: usize },

    /// Failure reported by the LLM collaborator
    #[error("Collaborator error: {message}")]
    Collaborator { message: String, retryable: bool },

    /// Graph structure is invalid
    #[error("Graph validation error: {0}")]
    Validation(String),

    /// A node function returned an error of its own
    #[error("Node '{node}' execution failed: {error}")]
    NodeExecution { node: String, error: String },

    /// A node did not finish within the configured timeout
    #[error("Node '{node}' timed out after {duration_ms}ms")]
    Timeout { node: String, duration_ms: u64 },

    /// Checkpoint store failure
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// JSON conversion failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure of a run, tagged with where it happened
    #[error("Run failed at node '{node}' (step {step}): {source}")]
    Run {
        node: String,
        step: u64,
        #[source]
        source: Box<GraphError>,
    },
}

impl GraphError {
    /// Collaborator failure that is not worth retrying
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
            retryable: false,
        }
    }

    /// Collaborator failure that may succeed on retry
    pub fn collaborator_retryable(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn node_execution(node: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::NodeExecution {
            node: node.into(),
            error: error.to_string(),
        }
    }

    /// Attach node and step information; already-tagged errors are kept as is
    pub fn in_run(self, node: impl Into<String>, step: u64) -> Self {
        match self {
            tagged @ Self::Run { .. } => tagged,
            other => Self::Run {
                node: node.into(),
                step,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with run context stripped
    pub fn root(&self) -> &GraphError {
        match self {
            Self::Run { source, .. } => source.root(),
            other => other,
        }
    }

    /// Node and step of a tagged run failure
    pub fn location(&self) -> Option<(&str, u64)> {
        match self {
            Self::Run { node, step, .. } => Some((node.as_str(), *step)),
            _ => None,
        }
    }

    /// Whether retrying the operation might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root(),
            Self::Collaborator {
                retryable: true,
                ..
            } | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_run_wraps_once() {
        let err = GraphError::UnknownTool {
            tool: "add".into(),
        }
        .in_run("tools", 2)
        .in_run("outer", 9);

        assert_eq!(err.location(), Some(("tools", 2)));
        assert!(matches!(err.root(), GraphError::UnknownTool { tool } if tool == "add"));
        assert!(err.to_string().contains("step 2"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(GraphError::collaborator_retryable("429").is_retryable());
        assert!(!GraphError::collaborator("bad key").is_retryable());
        assert!(GraphError::collaborator_retryable("503")
            .in_run("agent", 1)
            .is_retryable());
        assert!(!GraphError::InvalidMerge("x".into()).is_retryable());
    }
}
