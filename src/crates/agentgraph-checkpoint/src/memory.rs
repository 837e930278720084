//! In-memory checkpoint storage for development and testing
//!
//! [`InMemoryCheckpointStore`] keeps one checkpoint per session in an
//! `Arc<RwLock<HashMap>>`. Data is lost when the process exits.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  InMemoryCheckpointStore                     │
//! │  Arc<RwLock<HashMap<session, Checkpoint>>>   │
//! │    "session-1" → Checkpoint { step: 4 }      │
//! │    "session-2" → Checkpoint { step: 1 }      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Clones share the same storage, so a store can be handed to several
//! compiled graphs.

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::traits::CheckpointStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type CheckpointStorage = Arc<RwLock<HashMap<String, Checkpoint>>>;

/// In-memory [`CheckpointStore`]
#[derive(Clone)]
pub struct InMemoryCheckpointStore {
    storage: CheckpointStorage,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of sessions with a checkpoint
    pub async fn session_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Drop every stored checkpoint
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

impl Default for InMemoryCheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        tracing::trace!(
            session_id = %checkpoint.session_id,
            step = checkpoint.step,
            "storing checkpoint in memory"
        );
        let mut storage = self.storage.write().await;
        storage.insert(checkpoint.session_id.clone(), checkpoint);
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self.storage.read().await.get(session_id).cloned())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.storage.write().await.remove(session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut sessions: Vec<String> = self.storage.read().await.keys().cloned().collect();
        sessions.sort();
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let store = InMemoryCheckpointStore::new();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_checkpoint() {
        let store = InMemoryCheckpointStore::new();
        store.save("s1", json!({"messages": []}), 1).await.unwrap();
        store
            .save("s1", json!({"messages": [], "k": 2}), 2)
            .await
            .unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.step, 2);
        assert_eq!(loaded.state["k"], json!(2));
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryCheckpointStore::new();
        store.save("a", json!({"v": 1}), 1).await.unwrap();
        store.save("b", json!({"v": 2}), 5).await.unwrap();

        assert_eq!(store.load("a").await.unwrap().unwrap().state["v"], json!(1));
        assert_eq!(store.load("b").await.unwrap().unwrap().step, 5);
        assert_eq!(store.list_sessions().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = InMemoryCheckpointStore::new();
        store.save("a", json!({}), 1).await.unwrap();
        store.save("b", json!({}), 1).await.unwrap();

        store.delete("a").await.unwrap();
        store.delete("missing").await.unwrap();
        assert!(store.load("a").await.unwrap().is_none());

        store.clear().await;
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let store = InMemoryCheckpointStore::new();
        let other = store.clone();
        store.save("shared", json!({}), 3).await.unwrap();
        assert_eq!(other.load("shared").await.unwrap().unwrap().step, 3);
    }
}
