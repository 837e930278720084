use crate::edges::EdgeTable;
use crate::error::{GraphError, Result};
use crate::graph::{NodeId, NodeRegistry};
use agentgraph_checkpoint::CheckpointStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Node executions allowed per run unless configured otherwise
pub const DEFAULT_STEP_BUDGET: usize = 25;

/// Validated, executable graph
#[derive(Clone)]
pub struct CompiledGraph {
    pub(crate) name: Arc<str>,
    pub(crate) nodes: Arc<NodeRegistry>,
    pub(crate) edges: Arc<EdgeTable>,
    pub(crate) checkpointer: Option<Arc<dyn CheckpointStore>>,
    pub(crate) step_budget: usize,
    pub(crate) node_timeout: Option<Duration>,
    pub(crate) interrupt_before: Arc<HashSet<NodeId>>,
}

impl CompiledGraph {
    pub(crate) fn new(name: String, nodes: NodeRegistry, edges: EdgeTable) -> Self {
        Self {
            name: name.into(),
            nodes: Arc::new(nodes),
            edges: Arc::new(edges),
            checkpointer: None,
            step_budget: DEFAULT_STEP_BUDGET,
            node_timeout: None,
            interrupt_before: Arc::new(HashSet::new()),
        }
    }

    /// Persist a checkpoint after every root-level step of sessioned runs
    pub fn with_checkpointer(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpointer = Some(store);
        self
    }

    /// Maximum node executions per run
    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = budget;
        self
    }

    /// Fail a node that runs longer than `timeout`
    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = Some(timeout);
        self
    }

    /// Suspend before any of `nodes` runs. Fails with `UnknownNode`.
    pub fn with_interrupt_before<I, S>(mut self, nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        let mut set = HashSet::new();
        for node in nodes {
            let node = node.into();
            if !self.nodes.contains(&node) {
                return Err(GraphError::UnknownNode { node });
            }
            set.insert(node);
        }
        self.interrupt_before = Arc::new(set);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    pub fn step_budget(&self) -> usize {
        self.step_budget
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn CheckpointStore>> {
        self.checkpointer.as_ref()
    }
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("name", &self.name)
            .field("nodes", &self.nodes.names().collect::<Vec<_>>())
            .field("checkpointer", &self.checkpointer.is_some())
            .field("step_budget", &self.step_budget)
            .field("node_timeout", &self.node_timeout)
            .field("interrupt_before", &self.interrupt_before)
            .finish()
    }
}
