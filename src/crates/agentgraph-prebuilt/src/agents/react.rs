//! ReAct agent: reason with the model, act with tools, repeat.
//!
//! ```text
//!   __start__ ──▶ agent ──tools_condition──▶ tools
//!                   ▲  │                       │
//!                   │  └──────▶ __end__        │
//!                   └──────────────────────────┘
//! ```
//!
//! The `agent` node sends the conversation (with the optional system
//! prompt in front) and the tool definitions to the model and appends its
//! reply. The `tools` node is a [`ToolNode`]. A handoff tool makes the
//! `tools` node leave the agent graph, see [`crate::handoff`].
//!
//! # Example
//!
//! ```rust
//! use agentgraph_core::llm::ScriptedChatModel;
//! use agentgraph_core::{FnTool, Message, Tool, ToolCall, ToolError};
//! use agentgraph_prebuilt::create_react_agent;
//! use serde::Deserialize;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[derive(Deserialize)]
//! struct Pair { a: i64, b: i64 }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let add = FnTool::new("add", "Adds a and b.", |p: Pair| async move { Ok::<_, ToolError>(p.a + p.b) });
//! let model = Arc::new(ScriptedChatModel::new(vec![
//!     Message::assistant("").with_tool_calls(vec![ToolCall::new("c1", "add", json!({"a": 2, "b": 2}))]),
//!     Message::assistant("2 + 2 = 4"),
//! ]));
//!
//! let agent = create_react_agent(model, vec![Arc::new(add) as Arc<dyn Tool>])
//!     .with_prompt("You are a calculator.")
//!     .build()?;
//! let state = agent.invoke(json!({"messages": [["user", "What is 2 + 2?"]]})).await?;
//! assert_eq!(state.messages.len(), 4);
//! # Ok(())
//! # }
//! ```

use crate::error::{PrebuiltError, Result};
use crate::tool_node::{tools_condition, ToolNode};
use agentgraph_core::llm::{ChatModel, ToolDefinition};
use agentgraph_core::{CompiledGraph, Message, NodeResult, State, StateGraph, Tool, END, START};
use serde_json::json;
use std::sync::Arc;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Builder returned by [`create_react_agent`]
pub struct ReactAgentConfig {
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn Tool>>,
    prompt: Option<String>,
    name: String,
    max_iterations: usize,
}

impl ReactAgentConfig {
    pub fn new(model: Arc<dyn ChatModel>, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            model,
            tools,
            prompt: None,
            name: "react_agent".to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// System prompt sent ahead of the conversation; never stored in state
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Graph name; also the subgraph node name inside an agent network
    /// and the `name` put on the agent's replies
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Tool rounds allowed per run when the agent is the root graph
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<CompiledGraph> {
        if self.max_iterations == 0 {
            return Err(PrebuiltError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        let tool_node = ToolNode::from_tools(self.tools);
        let definitions: Arc<[ToolDefinition]> = tool_node.registry().definitions().into();
        let model = self.model;
        let prompt = self.prompt;
        let agent_name = self.name.clone();

        let mut graph = StateGraph::new().with_name(self.name);
        graph.add_node("agent", move |state: State| {
            let model = model.clone();
            let definitions = definitions.clone();
            let prompt = prompt.clone();
            let agent_name = agent_name.clone();
            async move {
                let mut messages = Vec::with_capacity(state.messages.len() + 1);
                if let Some(prompt) = prompt {
                    messages.push(Message::system(prompt));
                }
                messages.extend(state.messages);

                let reply = model.generate(messages, &definitions).await?.with_name(agent_name);
                tracing::debug!(tool_calls = reply.tool_calls().len(), "agent replied");
                Ok(NodeResult::from(json!({ "messages": [reply] })))
            }
        })?;
        graph.add_node_fn("tools", tool_node.into_node_fn())?;
        graph
            .add_edge(START, "agent")
            .add_conditional_edge("agent", tools_condition, [("tools", "tools"), (END, END)])
            .add_edge("tools", "agent");

        // each round is an agent step and a tools step, plus the final answer
        Ok(graph.compile()?.with_step_budget(self.max_iterations * 2 + 1))
    }
}

/// Agent/tools loop over `model` with `tools` available
pub fn create_react_agent(model: Arc<dyn ChatModel>, tools: Vec<Arc<dyn Tool>>) -> ReactAgentConfig {
    ReactAgentConfig::new(model, tools)
}
