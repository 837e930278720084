//! Checkpoint data model
//!
//! A [`Checkpoint`] is the full state snapshot of one session at a step
//! boundary. Stores keep exactly one checkpoint per session: every save
//! overwrites the previous one.
//!
//! ```text
//! session "thread-1"
//!   └─ Checkpoint { step: 3, state: {...}, metadata: { node: "tools", next: None } }
//! ```
//!
//! The state is kept as an opaque [`serde_json::Value`] so that the store
//! layer stays independent from the engine's state type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Unique checkpoint identifier
pub type CheckpointId = String;

/// Where a checkpoint was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// Written when a run starts with fresh input and suspends before any node
    Input,
    /// Written by the step loop after a node completed
    Loop,
    /// Written by an external state update
    Update,
}

/// Position information recorded alongside a checkpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Which part of the engine wrote the checkpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CheckpointSource>,

    /// Name of the node whose completion produced this checkpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    /// Node to run next when it is already decided (handoff target or
    /// interrupted node); `None` means "route from `node`"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// The run suspended before `next` ran
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub interrupted: bool,

    /// Free-form extra data
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, Value>,
}

impl CheckpointMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: CheckpointSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_interrupted(mut self, interrupted: bool) -> Self {
        self.interrupted = interrupted;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Snapshot of a session's state at a step boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Unique identifier (UUID v4)
    pub id: CheckpointId,

    /// Session the checkpoint belongs to
    pub session_id: String,

    /// Full state snapshot
    pub state: Value,

    /// Number of node executions the session has completed
    pub step: u64,

    /// When the checkpoint was created
    pub ts: DateTime<Utc>,

    #[serde(default)]
    pub metadata: CheckpointMetadata,
}

impl Checkpoint {
    /// Create a checkpoint with a fresh id and the current timestamp
    pub fn new(session_id: impl Into<String>, state: Value, step: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            state,
            step,
            ts: Utc::now(),
            metadata: CheckpointMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: CheckpointMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
