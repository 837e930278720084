//! Control transfer between nodes and between nested graphs
//!
//! A node that wants to pick its successor itself returns a [`Handoff`]
//! instead of a plain update. The engine merges the optional update and
//! jumps straight to `goto`, ignoring the edge table.
//!
//! ```text
//!   parent graph                     child graph (subgraph node "travel_advisor")
//!  ┌──────────────────────────┐     ┌────────────────────────────────┐
//!  │ travel_advisor ──────────┼────▶│ agent ──▶ tools                │
//!  │        ▲                 │     │             │ Handoff {       │
//!  │        │                 │     │             │   goto: hotel,  │
//!  │ hotel_advisor ◀──────────┼─────┼─────────────┘   scope: Parent }│
//!  └──────────────────────────┘     └────────────────────────────────┘
//! ```
//!
//! With [`HandoffScope::Parent`] the current engine frame is popped: the
//! child's accumulated messages flow into the parent state and the parent
//! continues at `goto`.

use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which engine frame resolves the target node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffScope {
    /// Target lives in the graph that ran the node
    #[default]
    Current,
    /// Target lives in the enclosing graph
    Parent,
}

/// Transient control signal returned by a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handoff {
    pub goto: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<Value>,

    #[serde(default)]
    pub scope: HandoffScope,
}

impl Handoff {
    /// Jump to `goto` in the current graph
    pub fn to(goto: impl Into<NodeId>) -> Self {
        Self {
            goto: goto.into(),
            update: None,
            scope: HandoffScope::Current,
        }
    }

    /// Jump to `goto` in the enclosing graph
    pub fn to_parent(goto: impl Into<NodeId>) -> Self {
        Self::to(goto).with_scope(HandoffScope::Parent)
    }

    pub fn with_update(mut self, update: Value) -> Self {
        self.update = Some(update);
        self
    }

    pub fn with_scope(mut self, scope: HandoffScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn is_parent(&self) -> bool {
        self.scope == HandoffScope::Parent
    }
}
