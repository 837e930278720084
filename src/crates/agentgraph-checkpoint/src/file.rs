//! On-disk checkpoint storage
//!
//! [`FileCheckpointStore`] writes one JSON document per session into a
//! directory:
//!
//! ```text
//! <root>/
//!   ├─ thread-1.json
//!   └─ user%40example.json      (session "user@example")
//! ```
//!
//! Session ids are percent-encoded into file names. A save writes a
//! uniquely named sibling `.tmp` file and renames it over the target, so
//! readers never see a torn document. Saves and loads for the same session
//! are serialized through a per-session async mutex.

use crate::checkpoint::Checkpoint;
use crate::error::{CheckpointError, Result};
use crate::serializer::{JsonSerializer, SerializerProtocol};
use crate::traits::CheckpointStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const EXTENSION: &str = "json";

/// Directory-backed [`CheckpointStore`]
#[derive(Clone)]
pub struct FileCheckpointStore {
    root: PathBuf,
    serializer: JsonSerializer,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl FileCheckpointStore {
    /// Store rooted at `root`; the directory is created on first save
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            serializer: JsonSerializer::pretty(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", encode_session_id(session_id), EXTENSION))
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn read_checkpoint(&self, path: &Path) -> Result<Option<Checkpoint>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let checkpoint: Checkpoint = self.serializer.loads(&bytes).map_err(|e| {
                    CheckpointError::Corrupt {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Some(checkpoint))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        let lock = self.session_lock(&checkpoint.session_id).await;
        let _guard = lock.lock().await;

        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.session_path(&checkpoint.session_id);
        let tmp = self.root.join(format!(
            "{}.{}.tmp",
            encode_session_id(&checkpoint.session_id),
            Uuid::new_v4().simple()
        ));
        let bytes = self.serializer.dumps(&checkpoint)?;

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CheckpointError::Commit {
                path,
                reason: e.to_string(),
            });
        }

        tracing::debug!(
            session_id = %checkpoint.session_id,
            step = checkpoint.step,
            path = %path.display(),
            "checkpoint written"
        );
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;
        self.read_checkpoint(&self.session_path(session_id)).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;
        match tokio::fs::remove_file(self.session_path(session_id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        // drop the session's mutex unless another caller is holding or waiting on it
        let mut locks = self.locks.lock().await;
        if locks
            .get(session_id)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(held) <= 2)
        {
            locks.remove(session_id);
        }
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let decoded = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_session_id);
            match decoded {
                Some(id) => sessions.push(id),
                None => tracing::warn!(path = %path.display(), "skipping unrecognized file"),
            }
        }
        sessions.sort();
        Ok(sessions)
    }
}

fn encode_session_id(session_id: &str) -> String {
    urlencoding::encode(session_id).into_owned()
}

fn decode_session_id(encoded: &str) -> Option<String> {
    urlencoding::decode(encoded).ok().map(|id| id.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_id_encoding_roundtrip() {
        for id in ["plain", "user@example.com", "a/b\\c", "ünïcode", "with_underscore", "50%"] {
            let encoded = encode_session_id(id);
            assert!(!encoded.contains('/') && !encoded.contains('\\'));
            assert_eq!(decode_session_id(&encoded).as_deref(), Some(id));
        }
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(decode_session_id("abc%ff").is_none());
        assert_eq!(encode_session_id("user@example"), "user%40example");
    }

    proptest::proptest! {
        #[test]
        fn prop_encoded_ids_are_safe_file_names(id in "\\PC{1,24}") {
            let encoded = encode_session_id(&id);
            proptest::prop_assert!(encoded
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"-._~%".contains(&b)));
            proptest::prop_assert_eq!(decode_session_id(&encoded), Some(id));
        }
    }

    #[tokio::test]
    async fn test_missing_directory_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("not-created"));
        assert!(store.load("s").await.unwrap().is_none());
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.save("s", json!({"messages": []}), 1).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["s.json".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_stores_share_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileCheckpointStore::new(dir.path());
        let second = FileCheckpointStore::new(dir.path());

        let writes = (0..20u64).map(|step| {
            let store = if step % 2 == 0 { first.clone() } else { second.clone() };
            async move { store.save("shared", json!({"messages": []}), step).await }
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap();
        }

        assert!(first.load("shared").await.unwrap().is_some());
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["shared.json".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_releases_session_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        for id in ["a", "b"] {
            store.save(id, json!({"messages": []}), 1).await.unwrap();
        }
        assert_eq!(store.locks.lock().await.len(), 2);

        store.delete("a").await.unwrap();
        store.delete("never-saved").await.unwrap();

        let locks = store.locks.lock().await;
        assert_eq!(locks.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), b"{oops").unwrap();
        let store = FileCheckpointStore::new(dir.path());
        assert!(matches!(
            store.load("bad").await,
            Err(CheckpointError::Corrupt { .. })
        ));
    }
}
