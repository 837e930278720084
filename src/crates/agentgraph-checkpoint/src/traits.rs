//! Pluggable checkpoint storage
//!
//! [`CheckpointStore`] is the only persistence seam of the engine. A store
//! holds at most one checkpoint per session; `put` replaces it atomically
//! and `load` returns `None` when nothing was ever saved.
//!
//! # Implementing a backend
//!
//! ```rust,ignore
//! use agentgraph_checkpoint::{Checkpoint, CheckpointStore, Result};
//! use async_trait::async_trait;
//!
//! struct RedisStore { /* ... */ }
//!
//! #[async_trait]
//! impl CheckpointStore for RedisStore {
//!     async fn put(&self, checkpoint: Checkpoint) -> Result<()> { todo!() }
//!     async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>> { todo!() }
//!     async fn delete(&self, session_id: &str) -> Result<()> { todo!() }
//!     async fn list_sessions(&self) -> Result<Vec<String>> { todo!() }
//! }
//! ```
//!
//! # See Also
//!
//! - [`InMemoryCheckpointStore`](crate::InMemoryCheckpointStore)
//! - [`FileCheckpointStore`](crate::FileCheckpointStore)

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Storage backend for session checkpoints.
///
/// Writes for one session must be atomic: a concurrent `load` observes
/// either the previous checkpoint or the new one, never a mix.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Store `checkpoint`, replacing any prior checkpoint of its session
    async fn put(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Latest checkpoint of `session_id`, or `None` when missing
    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>>;

    /// Remove the checkpoint of `session_id`; missing sessions are ignored
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// All session ids that currently have a checkpoint
    async fn list_sessions(&self) -> Result<Vec<String>>;

    /// Save `state` at `step` for `session_id`, overwriting the prior checkpoint
    async fn save(&self, session_id: &str, state: Value, step: u64) -> Result<Checkpoint> {
        let checkpoint = Checkpoint::new(session_id, state, step);
        self.put(checkpoint.clone()).await?;
        Ok(checkpoint)
    }
}
