//! The walkthrough flows behind each subcommand.
//!
//! Every flow takes the collaborator from the caller and writes the
//! conversation to `out`, so the same code runs against a live model in
//! the binary and against a scripted one in tests.

use crate::demo_tools;
use agentgraph_checkpoint::CheckpointStore;
use agentgraph_core::llm::{ChatModel, ToolDefinition};
use agentgraph_core::messages::coerce_message;
use agentgraph_core::{
    CompiledGraph, Message, NodeResult, RunConfig, State, StateGraph, StreamEvent, StreamMode,
    Tool, END, START,
};
use agentgraph_prebuilt::{create_agent_network, create_react_agent, make_handoff_tool, tools_condition, ToolNode};
use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tooling::logging::timed;

pub const TRAVEL_PROMPT: &str =
    "You are a general travel expert that can recommend travel destinations (e.g. countries, cities, etc). ";

pub const TRAVEL_HANDOFF_PROMPT: &str = "You are a general travel expert that can recommend travel destinations (e.g. countries, cities, etc). \
If you need hotel recommendations, ask 'hotel_advisor' for help. \
You MUST include human-readable response before transferring to another agent.";

pub const HOTEL_HANDOFF_PROMPT: &str = "You are a hotel expert that can provide hotel recommendations for a given destination. \
If you need help picking travel destinations, ask 'travel_advisor' for help. \
You MUST include human-readable response before transferring to another agent.";

/// `chatbot` node over `model`; with tools it loops through a `tools` node
pub fn chatbot_graph(model: Arc<dyn ChatModel>, tools: Vec<Arc<dyn Tool>>) -> agentgraph_core::Result<CompiledGraph> {
    let tool_node = ToolNode::from_tools(tools);
    let definitions: Arc<[ToolDefinition]> = tool_node.registry().definitions().into();
    let with_tools = !definitions.is_empty();

    let mut graph = StateGraph::new().with_name("chatbot");
    graph.add_node("chatbot", move |state: State| {
        let model = model.clone();
        let definitions = definitions.clone();
        async move {
            let reply = model.generate(state.messages, &definitions).await?;
            Ok(NodeResult::from(json!({ "messages": [reply] })))
        }
    })?;
    graph.add_edge(START, "chatbot");

    if with_tools {
        graph.add_node_fn("tools", tool_node.into_node_fn())?;
        graph
            .add_conditional_edge("chatbot", tools_condition, [("tools", "tools"), (END, END)])
            .add_edge("tools", "chatbot");
    } else {
        graph.add_edge("chatbot", END);
    }
    graph.compile()
}

fn user_input(text: &str) -> Value {
    json!({ "messages": [["user", text]] })
}

fn update_messages(update: &Value) -> Result<Vec<Message>> {
    let Some(messages) = update.get("messages").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    messages
        .iter()
        .map(|m| coerce_message(m).context("malformed message in update"))
        .collect()
}

/// Stream updates, handing every node's new messages to `print`
async fn stream_updates<F>(graph: &CompiledGraph, input: Value, mut print: F) -> Result<()>
where
    F: FnMut(&str, Vec<Message>) -> Result<()>,
{
    let mut events = graph.stream(Some(input), RunConfig::new(), StreamMode::Updates);
    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Updates { node, update } => {
                tracing::debug!(%node, "update");
                print(&node, update_messages(&update)?)?;
            }
            StreamEvent::Values(_) => {}
            StreamEvent::Suspended { next } => {
                anyhow::bail!("run suspended before '{next}'");
            }
        }
    }
    Ok(())
}

/// One chatbot node; prints the assistant's reply
pub async fn chat<W: Write>(model: Arc<dyn ChatModel>, input: &str, out: &mut W) -> Result<()> {
    let graph = chatbot_graph(model, Vec::new())?;
    stream_updates(&graph, user_input(input), |_, messages| {
        if let Some(last) = messages.last() {
            writeln!(out, "Assistant: {}", last.content.as_text())?;
        }
        Ok(())
    })
    .await
}

/// Chatbot with calculator tools; prints the last message of every step
pub async fn tools<W: Write>(model: Arc<dyn ChatModel>, input: &str, out: &mut W) -> Result<()> {
    let graph = chatbot_graph(model, demo_tools::calculator())?;
    stream_updates(&graph, user_input(input), |_, messages| {
        if let Some(last) = messages.last() {
            writeln!(out, "{last}")?;
        }
        Ok(())
    })
    .await
}

/// Prebuilt travel advisor hosted as a node; prints everything it adds
pub async fn react<W: Write>(model: Arc<dyn ChatModel>, input: &str, out: &mut W) -> Result<()> {
    let advisor = create_react_agent(
        model,
        vec![
            demo_tools::travel_recommendations(),
            demo_tools::hotel_recommendations(),
        ],
    )
    .with_name("travel_advisor")
    .with_prompt(TRAVEL_PROMPT)
    .build()?;

    let mut graph = StateGraph::new();
    graph.add_subgraph("travel_advisor", advisor)?;
    graph.add_edge(START, "travel_advisor").add_edge("travel_advisor", END);
    let graph = graph.compile()?;

    stream_updates(&graph, user_input(input), |_, messages| {
        for message in messages {
            writeln!(out, "{message}")?;
        }
        Ok(())
    })
    .await
}

/// Run `turns` in one session backed by `store`; returns the final state
pub async fn memory<W: Write>(
    model: Arc<dyn ChatModel>,
    store: Arc<dyn CheckpointStore>,
    session_id: &str,
    turns: &[&str],
    out: &mut W,
) -> Result<State> {
    let graph = chatbot_graph(model, Vec::new())?.with_checkpointer(store);
    let config = RunConfig::new().with_session(session_id);

    let mut state = State::new();
    for (i, turn) in turns.iter().enumerate() {
        if i > 0 {
            writeln!(out, "\nRESUMING THE CONVERSATION (STATE IS RESTORED)\n")?;
        }
        let run = graph.invoke_with_config(Some(json!({ "messages": [["human", turn]] })), config.clone());
        state = timed("memory turn", run).await?;
        for message in &state.messages {
            writeln!(out, "{message}")?;
        }

        let snapshot = graph
            .get_state(session_id)
            .await?
            .with_context(|| format!("no checkpoint for session '{session_id}'"))?;
        tracing::info!(
            session = session_id,
            step = snapshot.step,
            messages = snapshot.state.messages.len(),
            "session saved"
        );
    }
    Ok(state)
}

/// Travel and hotel advisors as sibling agents; returns the final state
pub async fn handoff<W: Write>(model: Arc<dyn ChatModel>, input: &str, out: &mut W) -> Result<State> {
    let travel = create_react_agent(
        model.clone(),
        vec![
            demo_tools::travel_recommendations(),
            make_handoff_tool("hotel_advisor"),
        ],
    )
    .with_name("travel_advisor")
    .with_prompt(TRAVEL_HANDOFF_PROMPT)
    .build()?;
    let hotel = create_react_agent(
        model,
        vec![
            demo_tools::hotel_recommendations(),
            make_handoff_tool("travel_advisor"),
        ],
    )
    .with_name("hotel_advisor")
    .with_prompt(HOTEL_HANDOFF_PROMPT)
    .build()?;

    let network = create_agent_network(vec![travel, hotel], "travel_advisor")?;
    let state = timed("agent network", network.invoke(user_input(input))).await?;
    for message in &state.messages {
        writeln!(out, "{message}")?;
    }
    Ok(state)
}
