//! # agentgraph-core
//!
//! A small directed-graph execution engine over a shared conversation
//! state.
//!
//! ```text
//!   ┌─────────┐     ┌──────────┐  tools_condition   ┌───────┐
//!   │ __start__ ├──▶│ chatbot  ├───────────────────▶│ tools │
//!   └─────────┘     └────┬─────┘◀───────────────────┴───────┘
//!                        │ "__end__"
//!                        ▼
//!                   ┌─────────┐
//!                   │ __end__ │
//!                   └─────────┘
//! ```
//!
//! # Building blocks
//!
//! - [`State`] and [`merge`](state::merge) - the conversation log plus
//!   auxiliary values; messages append, everything else overwrites
//! - [`StateGraph`] - node registry and edge table, validated by `compile`
//! - [`CompiledGraph`] - the step loop: execute, merge, checkpoint, route
//! - [`Handoff`] - explicit control transfer, optionally to the parent graph
//! - [`tool`] - tool registry and the tool invocation adapter
//! - [`llm`] - the [`ChatModel`](llm::ChatModel) collaborator seam
//!
//! # Quick Start
//!
//! ```rust
//! use agentgraph_core::{Message, NodeResult, StateGraph, END, START};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> agentgraph_core::Result<()> {
//! let mut graph = StateGraph::new();
//! graph.add_node("greeter", |_state| async {
//!     Ok(NodeResult::from(json!({"messages": [Message::assistant("Hello!")]})))
//! })?;
//! graph.add_edge(START, "greeter").add_edge("greeter", END);
//!
//! let app = graph.compile()?;
//! let state = app.invoke(json!({"messages": [["user", "Hi"]]})).await?;
//! assert_eq!(state.messages.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Persistence
//!
//! Attach any [`agentgraph_checkpoint::CheckpointStore`] with
//! [`CompiledGraph::with_checkpointer`] and pass a session id in
//! [`RunConfig`]; the session then resumes from its last checkpoint.

pub mod builder;
pub mod compiled;
pub mod edges;
pub mod error;
pub mod graph;
pub mod handoff;
pub mod llm;
pub mod messages;
pub mod node_result;
pub mod state;
pub mod tool;

pub use builder::StateGraph;
pub use compiled::{
    CompiledGraph, EventStream, Execution, RunConfig, RunOutcome, RunStatus, StateSnapshot,
    StreamEvent, StreamMode, DEFAULT_STEP_BUDGET,
};
pub use edges::{Edge, EdgeTable};
pub use error::{GraphError, Result};
pub use graph::{NodeFn, NodeId, NodeKind, NodeRegistry, END, START};
pub use handoff::{Handoff, HandoffScope};
pub use messages::{Message, MessageContent, MessageRole, ToolCall};
pub use node_result::NodeResult;
pub use state::State;
pub use tool::{
    execute_pending_tool_calls, invoke_pending_tool_calls, FnTool, Tool, ToolError,
    ToolInvocation, ToolRegistry,
};
