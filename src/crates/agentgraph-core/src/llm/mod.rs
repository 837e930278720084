//! LLM collaborator traits and types
//!
//! The engine never talks to a model provider directly. Agent nodes hold an
//! `Arc<dyn ChatModel>` handed to them at construction time and call
//! [`ChatModel::generate`] with the conversation so far and the tool
//! definitions they expose.
//!
//! ```rust,ignore
//! use agentgraph_core::llm::{ChatModel, ToolDefinition};
//! use agentgraph_core::Message;
//!
//! let reply = model
//!     .generate(vec![Message::user("What is 2 + 2?")], &[add.definition()])
//!     .await?;
//! ```
//!
//! Concrete providers live in the `llm` crate. [`ScriptedChatModel`]
//! replays canned replies for tests and offline demos.
//!
//! # See Also
//!
//! - [`ChatModel`] - trait every provider implements
//! - [`BoundChatModel`] - a model with tools attached
//! - [`ToolDefinition`] - tool spec sent to the model

pub mod config;
pub mod response;
pub mod scripted;
pub mod tools;
pub mod traits;

pub use config::{ChatConfig, ChatRequest};
pub use response::{ChatResponse, UsageMetadata};
pub use scripted::ScriptedChatModel;
pub use tools::ToolDefinition;
pub use traits::{bind_tools, BoundChatModel, ChatModel};
