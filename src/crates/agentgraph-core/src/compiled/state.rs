use super::graph::CompiledGraph;
use super::types::StateSnapshot;
use crate::error::{GraphError, Result};
use crate::graph::{END, START};
use crate::state::State;
use agentgraph_checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource};
use serde_json::Value;

impl CompiledGraph {
    /// Persisted position of `session_id`, `None` if it has no checkpoint
    pub async fn get_state(&self, session_id: &str) -> Result<Option<StateSnapshot>> {
        let store = self.require_checkpointer()?;
        let Some(checkpoint) = store.load(session_id).await? else {
            return Ok(None);
        };

        let state = State::try_from(checkpoint.state)?;
        let next = match (&checkpoint.metadata.next, &checkpoint.metadata.node) {
            (Some(next), _) => Some(next.clone()),
            (None, Some(node)) => Some(self.edges.resolve(node, &state)?),
            (None, None) => Some(self.edges.resolve(START, &state)?),
        }
        .filter(|next| next != END);

        Ok(Some(StateSnapshot {
            state,
            step: checkpoint.step,
            next,
            interrupted: checkpoint.metadata.interrupted,
            checkpoint_id: checkpoint.id,
            metadata: checkpoint.metadata,
        }))
    }

    /// Merge `update` into the persisted state of `session_id` as if
    /// `as_node` had produced it, and save the result.
    ///
    /// A later no-input resume routes from `as_node`; without it the
    /// session position is kept.
    pub async fn update_state(
        &self,
        session_id: &str,
        update: &Value,
        as_node: Option<&str>,
    ) -> Result<StateSnapshot> {
        let store = self.require_checkpointer()?;
        if let Some(node) = as_node {
            if !self.nodes.contains(node) {
                return Err(GraphError::UnknownNode {
                    node: node.to_string(),
                });
            }
        }

        let previous = store.load(session_id).await?;
        let (state, step, mut metadata) = match previous {
            Some(checkpoint) => (
                State::try_from(checkpoint.state)?,
                checkpoint.step,
                checkpoint.metadata,
            ),
            None => (State::new(), 0, CheckpointMetadata::new()),
        };
        let state = state.merge(update)?;

        metadata.source = Some(CheckpointSource::Update);
        if let Some(node) = as_node {
            metadata.node = Some(node.to_string());
            metadata.next = None;
            metadata.interrupted = false;
        }

        let checkpoint = Checkpoint::new(session_id, state.to_value()?, step).with_metadata(metadata);
        store.put(checkpoint).await?;
        tracing::info!(session = session_id, as_node = ?as_node, "state updated externally");

        self.get_state(session_id)
            .await?
            .ok_or_else(|| GraphError::Validation(format!("checkpoint for '{session_id}' vanished")))
    }

    fn require_checkpointer(&self) -> Result<&std::sync::Arc<dyn agentgraph_checkpoint::CheckpointStore>> {
        self.checkpointer.as_ref().ok_or_else(|| {
            GraphError::Validation(format!("graph '{}' has no checkpoint store", self.name))
        })
    }
}
