//! Node identifiers and the node registry
//!
//! Nodes are looked up by name at run time. Two names are reserved:
//!
//! - [`START`] (`"__start__"`) - virtual entry, only ever an edge source
//! - [`END`] (`"__end__"`) - virtual exit, only ever an edge target
//!
//! A registered node is either an async function over the [`State`] or a
//! whole compiled graph executed as a nested engine frame.

use crate::compiled::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::node_result::NodeResult;
use crate::state::State;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// Node identifier
pub type NodeId = String;

/// Virtual entry node
pub const START: &str = "__start__";

/// Virtual exit node
pub const END: &str = "__end__";

/// Async node function: current state in, update or handoff out
pub type NodeFn = Arc<dyn Fn(State) -> BoxFuture<'static, Result<NodeResult>> + Send + Sync>;

/// What runs when a node is scheduled
#[derive(Clone)]
pub enum NodeKind {
    Function(NodeFn),
    Subgraph(CompiledGraph),
}

/// A registered node
#[derive(Clone)]
pub struct NodeSpec {
    pub name: NodeId,
    pub kind: NodeKind,
}

impl std::fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            NodeKind::Function(_) => "<function>".to_string(),
            NodeKind::Subgraph(graph) => format!("<subgraph {}>", graph.name()),
        };
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// Name → node table of one graph
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, NodeSpec>,
    order: Vec<NodeId>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Fails with `DuplicateNode` if the name is taken or reserved.
    pub fn register(&mut self, name: impl Into<NodeId>, kind: NodeKind) -> Result<()> {
        let name = name.into();
        if name == START || name == END || self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateNode { node: name });
        }
        self.order.push(name.clone());
        self.nodes.insert(name.clone(), NodeSpec { name, kind });
        Ok(())
    }

    /// Look up a node. Fails with `UnknownNode` if absent.
    pub fn get(&self, name: &str) -> Result<&NodeSpec> {
        self.nodes.get(name).ok_or_else(|| GraphError::UnknownNode {
            node: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Node names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> NodeKind {
        NodeKind::Function(Arc::new(|_state| Box::pin(async { Ok(NodeResult::empty()) })))
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = NodeRegistry::new();
        registry.register("chatbot", noop()).unwrap();
        registry.register("tools", noop()).unwrap();

        assert_eq!(registry.get("chatbot").unwrap().name, "chatbot");
        assert!(registry.contains("tools"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["chatbot", "tools"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut registry = NodeRegistry::new();
        registry.register("a", noop()).unwrap();
        let err = registry.register("a", noop()).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode { node } if node == "a"));
    }

    #[test]
    fn test_reserved_names_rejected() {
        let mut registry = NodeRegistry::new();
        assert!(registry.register(START, noop()).is_err());
        assert!(registry.register(END, noop()).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_node() {
        let registry = NodeRegistry::new();
        let err = registry.get("ghost").unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode { node } if node == "ghost"));
    }
}
