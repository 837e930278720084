//! # agentgraph-checkpoint
//!
//! Session persistence for the agentgraph engine.
//!
//! The engine writes one [`Checkpoint`] per completed node when a store is
//! attached and reads it back when a session is invoked again. Everything
//! behind the [`CheckpointStore`] trait is pluggable:
//!
//! - [`InMemoryCheckpointStore`] - process-local, for tests and demos
//! - [`FileCheckpointStore`] - one JSON document per session on disk
//!
//! ```rust
//! use agentgraph_checkpoint::{CheckpointStore, InMemoryCheckpointStore};
//! use serde_json::json;
//!
//! # tokio_test_block(async {
//! let store = InMemoryCheckpointStore::new();
//! assert!(store.load("thread-1").await.unwrap().is_none());
//!
//! store.save("thread-1", json!({"messages": []}), 1).await.unwrap();
//! let checkpoint = store.load("thread-1").await.unwrap().unwrap();
//! assert_eq!(checkpoint.step, 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod checkpoint;
pub mod error;
pub mod file;
pub mod memory;
pub mod serializer;
pub mod traits;

pub use checkpoint::{Checkpoint, CheckpointId, CheckpointMetadata, CheckpointSource};
pub use error::{CheckpointError, Result};
pub use file::FileCheckpointStore;
pub use memory::InMemoryCheckpointStore;
pub use serializer::{JsonSerializer, SerializerProtocol};
pub use traits::CheckpointStore;
