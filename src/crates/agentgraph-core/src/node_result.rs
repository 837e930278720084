//! What a node hands back to the engine

use crate::handoff::Handoff;
use serde_json::Value;

/// Outcome of one node execution
#[derive(Debug, Clone, PartialEq)]
pub enum NodeResult {
    /// Partial state update, routed by the edge table
    Update(Value),

    /// Update plus an explicit jump
    Handoff(Handoff),
}

impl NodeResult {
    /// An update that changes nothing
    pub fn empty() -> Self {
        NodeResult::Update(Value::Object(Default::default()))
    }

    /// The state update carried by this result, if any
    pub fn update(&self) -> Option<&Value> {
        match self {
            NodeResult::Update(value) => Some(value),
            NodeResult::Handoff(handoff) => handoff.update.as_ref(),
        }
    }

    pub fn handoff(&self) -> Option<&Handoff> {
        match self {
            NodeResult::Handoff(handoff) => Some(handoff),
            NodeResult::Update(_) => None,
        }
    }
}

impl From<Value> for NodeResult {
    fn from(value: Value) -> Self {
        NodeResult::Update(value)
    }
}

impl From<Handoff> for NodeResult {
    fn from(handoff: Handoff) -> Self {
        NodeResult::Handoff(handoff)
    }
}
