//! Tool execution node
//!
//! [`ToolNode`] answers the tool calls of the last message in the state.
//!
//! ```text
//!  messages: [..., assistant{tool_calls: [add(2,2), transfer_to_x()]}]
//!                         │
//!                         ▼ ToolNode
//!  ┌────────────────────────────────────────────────────────┐
//!  │ resolve every call in the registry (unknown = fatal)    │
//!  │ run all calls concurrently                              │
//!  │ failures become error tool messages                     │
//!  └────────────────────────────────────────────────────────┘
//!                         │
//!          no handoff ────┴──── a handoff tool was called
//!               │                         │
//!   Update{messages: [tool, ...]}   Handoff{goto, update: {messages: [tool, ...]}}
//! ```
//!
//! Pair it with [`tools_condition`] on the agent node to build the usual
//! agent/tools loop.

use agentgraph_core::error::Result;
use agentgraph_core::{
    invoke_pending_tool_calls, NodeFn, NodeResult, State, Tool, ToolInvocation, ToolRegistry, END,
};
use futures::FutureExt;
use serde_json::json;
use std::sync::Arc;

/// Graph node that executes pending tool calls
#[derive(Clone, Default)]
pub struct ToolNode {
    tools: Arc<ToolRegistry>,
}

impl ToolNode {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            tools: Arc::new(registry),
        }
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self::new(ToolRegistry::from_tools(tools))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer the tool calls on the last message.
    ///
    /// Without pending calls this is an empty update. When a handoff tool
    /// was called the result is that handoff, carrying every tool message
    /// of this step as its update.
    pub async fn run(&self, state: &State) -> Result<NodeResult> {
        let Some(last) = state.last_message() else {
            return Ok(NodeResult::empty());
        };
        if !last.has_tool_calls() {
            tracing::debug!("no pending tool calls");
            return Ok(NodeResult::empty());
        }

        let invocations = invoke_pending_tool_calls(last, &self.tools).await?;

        let mut handoff = None;
        let mut messages = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            match invocation {
                ToolInvocation::Message(message) => messages.push(message),
                ToolInvocation::Handoff { message, handoff: h } => {
                    messages.push(message);
                    if handoff.is_none() {
                        handoff = Some(h);
                    } else {
                        tracing::warn!(ignored = %h.goto, "several handoffs in one step; keeping the first");
                    }
                }
            }
        }

        let update = json!({ "messages": messages });
        Ok(match handoff {
            Some(handoff) => handoff.with_update(update).into(),
            None => NodeResult::Update(update),
        })
    }

    /// Wrap as a node function for [`StateGraph::add_node_fn`](agentgraph_core::StateGraph::add_node_fn)
    pub fn into_node_fn(self) -> NodeFn {
        Arc::new(move |state: State| {
            let node = self.clone();
            async move { node.run(&state).await }.boxed()
        })
    }
}

impl std::fmt::Debug for ToolNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolNode")
            .field("tools", &self.tools.names())
            .finish()
    }
}

/// Route to `"tools"` when the last message calls tools, to END otherwise
pub fn tools_condition(state: &State) -> String {
    match state.last_message() {
        Some(message) if message.has_tool_calls() => "tools".to_string(),
        _ => END.to_string(),
    }
}
