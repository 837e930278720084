use crate::error::Result;
use crate::graph::NodeId;
use crate::state::State;
use agentgraph_checkpoint::CheckpointMetadata;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ready,
    Running,
    Suspended,
    Terminated,
    Failed,
}

impl RunStatus {
    /// Whether the run can make no further progress
    pub fn is_final(&self) -> bool {
        matches!(self, RunStatus::Terminated | RunStatus::Failed)
    }
}

/// Per-invocation settings
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Checkpoint key; without it nothing is persisted
    pub session_id: Option<String>,

    /// Overrides the graph's step budget for this run
    pub step_budget: Option<usize>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = Some(budget);
        self
    }
}

/// Where a run stopped
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub state: State,
    pub status: RunStatus,

    /// Session step counter after the run
    pub step: u64,

    /// Node the run suspended before, if it suspended
    pub next: Option<NodeId>,
}

/// Persisted position of a session
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub state: State,
    pub step: u64,

    /// Node a no-input resume would run first; `None` when finished
    pub next: Option<NodeId>,

    pub interrupted: bool,
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

/// What a stream reports after each root-level step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// Full state after each step
    #[default]
    Values,
    /// Only the update the step produced
    Updates,
}

/// One streamed execution event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Values(State),
    Updates { node: NodeId, update: Value },
    Suspended { next: NodeId },
}

/// Stream of execution events; a failure is delivered as the last item
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;
