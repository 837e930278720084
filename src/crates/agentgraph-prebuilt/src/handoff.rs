//! Handoff tools and multi-agent networks
//!
//! An agent hands the conversation to a peer by calling a
//! `transfer_to_<agent>` tool. The tool answers with a tool message and a
//! parent-scope [`Handoff`], so the graph that hosts both agents moves on
//! to the peer.
//!
//! ```rust,ignore
//! use agentgraph_prebuilt::{create_agent_network, create_react_agent, make_handoff_tool};
//!
//! let travel = create_react_agent(model.clone(), vec![recommend, make_handoff_tool("hotel_advisor")])
//!     .with_name("travel_advisor")
//!     .build()?;
//! let hotel = create_react_agent(model, vec![hotels, make_handoff_tool("travel_advisor")])
//!     .with_name("hotel_advisor")
//!     .build()?;
//!
//! let app = create_agent_network(vec![travel, hotel], "travel_advisor")?;
//! ```

use crate::error::Result;
use agentgraph_core::{
    CompiledGraph, Handoff, Message, StateGraph, Tool, ToolCall, ToolError, ToolInvocation, END, START,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Tool that transfers control to a sibling agent
#[derive(Debug, Clone)]
pub struct HandoffTool {
    agent: String,
    name: String,
    description: String,
}

impl HandoffTool {
    pub fn new(agent: impl Into<String>) -> Self {
        let agent = agent.into();
        Self {
            name: format!("transfer_to_{agent}"),
            description: format!("Ask {agent} for help."),
            agent,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Target agent
    pub fn agent(&self) -> &str {
        &self.agent
    }

    fn confirmation(&self) -> String {
        format!("Successfully transferred to {}", self.agent)
    }
}

#[async_trait]
impl Tool for HandoffTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, _args: Value) -> std::result::Result<Value, ToolError> {
        Ok(Value::String(self.confirmation()))
    }

    async fn invoke(&self, call: &ToolCall) -> ToolInvocation {
        tracing::info!(to = %self.agent, call_id = %call.id, "handing off");
        ToolInvocation::Handoff {
            message: Message::tool(self.confirmation(), call.id.clone()).with_name(self.name.clone()),
            handoff: Handoff::to_parent(self.agent.clone()),
        }
    }
}

/// `transfer_to_<agent>` tool, ready to hand to an agent
pub fn make_handoff_tool(agent: impl Into<String>) -> Arc<dyn Tool> {
    Arc::new(HandoffTool::new(agent))
}

/// Host `agents` as sibling subgraphs named after each agent graph.
///
/// The run starts at `entry`; an agent that answers without handing off
/// ends the run.
pub fn create_agent_network(agents: Vec<CompiledGraph>, entry: &str) -> Result<CompiledGraph> {
    let mut graph = StateGraph::new().with_name("agent_network");
    for agent in agents {
        let name = agent.name().to_string();
        graph.add_subgraph(name.clone(), agent)?;
        graph.add_edge(name, END);
    }
    graph.add_edge(START, entry);
    Ok(graph.compile()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentgraph_core::{GraphError, MessageRole};
    use serde_json::json;

    #[tokio::test]
    async fn test_handoff_tool_invocation() {
        let tool = make_handoff_tool("hotel_advisor");
        assert_eq!(tool.name(), "transfer_to_hotel_advisor");

        let invocation = tool.invoke(&ToolCall::new("call_7", tool.name(), json!({}))).await;
        let ToolInvocation::Handoff { message, handoff } = invocation else {
            panic!("expected a handoff");
        };
        assert_eq!(message.role, MessageRole::Tool);
        assert_eq!(message.text(), Some("Successfully transferred to hotel_advisor"));
        assert_eq!(message.tool_call_id.as_deref(), Some("call_7"));
        assert_eq!(message.name.as_deref(), Some("transfer_to_hotel_advisor"));
        assert_eq!(handoff, Handoff::to_parent("hotel_advisor"));
    }

    #[test]
    fn test_network_entry_must_exist() {
        let mut solo = StateGraph::new().with_name("solo");
        solo.add_node("answer", |_state| async { Ok(json!({}).into()) }).unwrap();
        solo.add_edge(START, "answer").add_edge("answer", END);

        let err = create_agent_network(vec![solo.compile().unwrap()], "missing").unwrap_err();
        assert!(matches!(
            err,
            crate::PrebuiltError::Graph(GraphError::UnknownNode { ref node }) if node == "missing"
        ));
    }
}
