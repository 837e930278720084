//! # agentgraph-prebuilt
//!
//! Ready-made pieces on top of `agentgraph-core`:
//!
//! - [`ToolNode`] and [`tools_condition`] - the tool half of an agent loop
//! - [`create_react_agent`] - model + tools loop as a compiled graph
//! - [`make_handoff_tool`] and [`create_agent_network`] - agents that pass
//!   the conversation to each other
//!
//! ```text
//!  agent_network
//!  ┌───────────────────────────────────────────────┐
//!  │  __start__ ──▶ travel_advisor ──▶ __end__      │
//!  │                   │  ▲                         │
//!  │  transfer_to_...  ▼  │  transfer_to_...        │
//!  │                hotel_advisor ───▶ __end__      │
//!  └───────────────────────────────────────────────┘
//! ```

pub mod agents;
pub mod error;
pub mod handoff;
pub mod tool_node;

pub use agents::{create_react_agent, ReactAgentConfig};
pub use error::{PrebuiltError, Result};
pub use handoff::{create_agent_network, make_handoff_tool, HandoffTool};
pub use tool_node::{tools_condition, ToolNode};
