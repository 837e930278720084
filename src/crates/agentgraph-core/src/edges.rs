//! Edge table and routing
//!
//! Every node, and the virtual [`START`], has exactly one outgoing edge:
//!
//! ```text
//!  Direct          chatbot ─────────────▶ END
//!
//!  Conditional     chatbot ──decide(state)──▶ "tools" ─▶ tools
//!                                          └▶ "__end__" ─▶ END
//! ```
//!
//! A conditional edge calls its decision function on the state after the
//! source node ran and looks the returned label up in its branch map. An
//! unmapped label is a [`GraphError::Routing`]. A source with more than one
//! edge is ambiguous and rejected by [`EdgeTable::validate`].

use crate::error::{GraphError, Result};
use crate::graph::{NodeId, NodeRegistry, END, START};
use crate::state::State;
use std::collections::HashMap;
use std::sync::Arc;

/// Decision function of a conditional edge
pub type RouterFn = Arc<dyn Fn(&State) -> String + Send + Sync>;

/// Outgoing edge of a node
#[derive(Clone)]
pub enum Edge {
    Direct(NodeId),
    Conditional {
        router: RouterFn,
        branches: HashMap<String, NodeId>,
    },
}

impl Edge {
    /// Every node this edge can lead to
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(to) => vec![to.as_str()],
            Edge::Conditional { branches, .. } => {
                let mut targets: Vec<&str> = branches.values().map(String::as_str).collect();
                targets.sort_unstable();
                targets.dedup();
                targets
            }
        }
    }
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(node_id) => f.debug_tuple("Direct").field(node_id).finish(),
            Edge::Conditional { branches, .. } => f
                .debug_struct("Conditional")
                .field("router", &"<function>")
                .field("branches", branches)
                .finish(),
        }
    }
}

/// Outgoing edges keyed by source node
#[derive(Clone, Debug, Default)]
pub struct EdgeTable {
    edges: HashMap<NodeId, Vec<Edge>>,
}

impl EdgeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, src: impl Into<NodeId>, dst: impl Into<NodeId>) {
        self.edges
            .entry(src.into())
            .or_default()
            .push(Edge::Direct(dst.into()));
    }

    pub fn add_conditional_edge(
        &mut self,
        src: impl Into<NodeId>,
        router: RouterFn,
        branches: HashMap<String, NodeId>,
    ) {
        self.edges
            .entry(src.into())
            .or_default()
            .push(Edge::Conditional { router, branches });
    }

    /// The single outgoing edge of `src`, if any
    pub fn outgoing(&self, src: &str) -> Option<&Edge> {
        self.edges.get(src).and_then(|edges| edges.first())
    }

    /// Next node after `src` given the state it produced
    pub fn resolve(&self, src: &str, state: &State) -> Result<NodeId> {
        match self.outgoing(src) {
            Some(Edge::Direct(to)) => Ok(to.clone()),
            Some(Edge::Conditional { router, branches }) => {
                let label = router(state);
                tracing::trace!(node = src, label = %label, "conditional edge evaluated");
                branches
                    .get(&label)
                    .cloned()
                    .ok_or_else(|| GraphError::Routing {
                        node: src.to_string(),
                        label,
                    })
            }
            None => Err(GraphError::Validation(format!(
                "node '{src}' has no outgoing edge"
            ))),
        }
    }

    /// Check the table against the registered nodes.
    ///
    /// Rejects ambiguous sources, unknown endpoints, edges out of END or
    /// into START, a missing entry edge and nodes without an outgoing edge.
    pub fn validate(&self, nodes: &NodeRegistry) -> Result<()> {
        if !self.edges.contains_key(START) {
            return Err(GraphError::Validation(format!(
                "graph has no entry edge from {START}"
            )));
        }

        let mut sources: Vec<&NodeId> = self.edges.keys().collect();
        sources.sort();
        for src in sources {
            let edges = &self.edges[src];
            if src == END {
                return Err(GraphError::Validation(format!(
                    "{END} cannot have outgoing edges"
                )));
            }
            if src != START && !nodes.contains(src) {
                return Err(GraphError::UnknownNode { node: src.clone() });
            }
            if edges.len() > 1 {
                return Err(GraphError::Validation(format!(
                    "ambiguous routing: node '{src}' has {} outgoing edges",
                    edges.len()
                )));
            }
            for target in edges.iter().flat_map(Edge::targets) {
                if target == START {
                    return Err(GraphError::Validation(format!(
                        "edge from '{src}' cannot target {START}"
                    )));
                }
                if target != END && !nodes.contains(target) {
                    return Err(GraphError::UnknownNode {
                        node: target.to_string(),
                    });
                }
            }
        }

        for name in nodes.names() {
            if !self.edges.contains_key(name) {
                return Err(GraphError::Validation(format!(
                    "node '{name}' has no outgoing edge"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::node_result::NodeResult;
    use serde_json::json;

    fn registry(names: &[&str]) -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        for name in names {
            registry
                .register(
                    *name,
                    NodeKind::Function(Arc::new(|_| Box::pin(async { Ok(NodeResult::empty()) }))),
                )
                .unwrap();
        }
        registry
    }

    fn branches(pairs: &[(&str, &str)]) -> HashMap<String, NodeId> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_direct_resolution() {
        let mut table = EdgeTable::new();
        table.add_edge(START, "a");
        table.add_edge("a", END);
        assert_eq!(table.resolve(START, &State::new()).unwrap(), "a");
        assert_eq!(table.resolve("a", &State::new()).unwrap(), END);
        assert!(table.validate(&registry(&["a"])).is_ok());
    }

    #[test]
    fn test_conditional_resolution() {
        let mut table = EdgeTable::new();
        table.add_conditional_edge(
            "a",
            Arc::new(|state: &State| {
                state
                    .get("go")
                    .and_then(|v| v.as_str())
                    .unwrap_or("stop")
                    .to_string()
            }),
            branches(&[("left", "b"), ("stop", END)]),
        );

        let left = State::from_input(&json!({"go": "left"})).unwrap();
        assert_eq!(table.resolve("a", &left).unwrap(), "b");
        assert_eq!(table.resolve("a", &State::new()).unwrap(), END);

        let right = State::from_input(&json!({"go": "right"})).unwrap();
        let err = table.resolve("a", &right).unwrap_err();
        assert!(matches!(err, GraphError::Routing { node, label } if node == "a" && label == "right"));
    }

    #[test]
    fn test_ambiguous_routing_rejected() {
        let mut table = EdgeTable::new();
        table.add_edge(START, "a");
        table.add_edge("a", END);
        table.add_conditional_edge("a", Arc::new(|_| "x".to_string()), branches(&[("x", END)]));
        let err = table.validate(&registry(&["a"])).unwrap_err();
        assert!(err.to_string().contains("ambiguous"));

        let mut table = EdgeTable::new();
        table.add_edge(START, "a");
        table.add_edge("a", END);
        table.add_edge("a", "a");
        assert!(table.validate(&registry(&["a"])).is_err());
    }

    #[test]
    fn test_unknown_endpoints_rejected() {
        let mut table = EdgeTable::new();
        table.add_edge(START, "a");
        table.add_edge("a", "ghost");
        assert!(matches!(
            table.validate(&registry(&["a"])),
            Err(GraphError::UnknownNode { node }) if node == "ghost"
        ));

        let mut table = EdgeTable::new();
        table.add_edge(START, "a");
        table.add_edge("a", END);
        table.add_edge("phantom", END);
        assert!(matches!(
            table.validate(&registry(&["a"])),
            Err(GraphError::UnknownNode { node }) if node == "phantom"
        ));
    }

    #[test]
    fn test_structural_rules() {
        // no entry
        let mut table = EdgeTable::new();
        table.add_edge("a", END);
        assert!(table.validate(&registry(&["a"])).is_err());

        // dangling node
        let mut table = EdgeTable::new();
        table.add_edge(START, "a");
        table.add_edge("a", END);
        assert!(table.validate(&registry(&["a", "b"])).is_err());

        // edge back into START
        let mut table = EdgeTable::new();
        table.add_edge(START, "a");
        table.add_edge("a", START);
        assert!(table.validate(&registry(&["a"])).is_err());

        // edge out of END
        let mut table = EdgeTable::new();
        table.add_edge(START, "a");
        table.add_edge("a", END);
        table.add_edge(END, "a");
        assert!(table.validate(&registry(&["a"])).is_err());
    }
}
