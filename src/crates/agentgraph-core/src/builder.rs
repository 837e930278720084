//! Graph construction
//!
//! [`StateGraph`] collects nodes and edges and turns them into an
//! executable [`CompiledGraph`]. All structural checks run in
//! [`compile`](StateGraph::compile):
//!
//! ```rust
//! use agentgraph_core::{StateGraph, Message, NodeResult, START, END};
//! use serde_json::json;
//!
//! # fn main() -> agentgraph_core::Result<()> {
//! let mut graph = StateGraph::new();
//! graph.add_node("chatbot", |state| async move {
//!     let question = state.last_message().and_then(|m| m.text()).unwrap_or_default().to_string();
//!     Ok(NodeResult::from(json!({"messages": [Message::assistant(format!("echo: {question}"))]})))
//! })?;
//! graph.add_edge(START, "chatbot").add_edge("chatbot", END);
//! let app = graph.compile()?;
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

use crate::compiled::CompiledGraph;
use crate::edges::{EdgeTable, RouterFn};
use crate::error::Result;
use crate::graph::{NodeFn, NodeId, NodeKind, NodeRegistry};
use crate::node_result::NodeResult;
use crate::state::State;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Builder for a graph over [`State`]
#[derive(Debug, Default)]
pub struct StateGraph {
    name: Option<String>,
    nodes: NodeRegistry,
    edges: EdgeTable,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used in logs and errors; defaults to `"graph"`
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Register an async node function. Fails with `DuplicateNode`.
    pub fn add_node<F, Fut>(&mut self, name: impl Into<NodeId>, func: F) -> Result<&mut Self>
    where
        F: Fn(State) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NodeResult>> + Send + 'static,
    {
        let func: NodeFn = Arc::new(move |state| Box::pin(func(state)));
        self.add_node_fn(name, func)
    }

    /// Register an already boxed node function
    pub fn add_node_fn(&mut self, name: impl Into<NodeId>, func: NodeFn) -> Result<&mut Self> {
        self.nodes.register(name, NodeKind::Function(func))?;
        Ok(self)
    }

    /// Register a compiled graph as a node; it runs as a nested engine frame
    pub fn add_subgraph(&mut self, name: impl Into<NodeId>, subgraph: CompiledGraph) -> Result<&mut Self> {
        self.nodes.register(name, NodeKind::Subgraph(subgraph))?;
        Ok(self)
    }

    pub fn add_edge(&mut self, src: impl Into<NodeId>, dst: impl Into<NodeId>) -> &mut Self {
        self.edges.add_edge(src, dst);
        self
    }

    /// Route out of `src` by the label `router` returns
    pub fn add_conditional_edge<F, I, K, V>(
        &mut self,
        src: impl Into<NodeId>,
        router: F,
        branches: I,
    ) -> &mut Self
    where
        F: Fn(&State) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<NodeId>,
    {
        let router: RouterFn = Arc::new(router);
        let branches: HashMap<String, NodeId> = branches
            .into_iter()
            .map(|(label, dst)| (label.into(), dst.into()))
            .collect();
        self.edges.add_conditional_edge(src, router, branches);
        self
    }

    /// Validate the structure and produce an executable graph
    pub fn compile(self) -> Result<CompiledGraph> {
        self.edges.validate(&self.nodes)?;
        let name = self.name.unwrap_or_else(|| "graph".to_string());
        tracing::debug!(graph = %name, nodes = self.nodes.len(), "graph compiled");
        Ok(CompiledGraph::new(name, self.nodes, self.edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::{END, START};
    use serde_json::json;

    async fn noop(_state: State) -> Result<NodeResult> {
        Ok(NodeResult::empty())
    }

    #[test]
    fn test_duplicate_node() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop).unwrap();
        assert!(matches!(
            graph.add_node("a", noop),
            Err(GraphError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn test_compile_checks_structure() {
        let mut graph = StateGraph::new();
        graph.add_node("a", noop).unwrap();
        graph.add_edge(START, "a");
        graph.add_edge("a", END);
        graph.add_conditional_edge("a", |_| "x".to_string(), [("x", END)]);
        assert!(graph.compile().is_err());
    }

    #[test]
    fn test_compile_ok() {
        let mut graph = StateGraph::new().with_name("calc");
        graph.add_node("a", noop).unwrap();
        graph.add_node("b", |_state| async { Ok(json!({"done": true}).into()) }).unwrap();
        graph
            .add_edge(START, "a")
            .add_conditional_edge("a", |_| "next".to_string(), [("next", "b"), ("stop", END)])
            .add_edge("b", END);
        let compiled = graph.compile().unwrap();
        assert_eq!(compiled.name(), "calc");
    }
}
