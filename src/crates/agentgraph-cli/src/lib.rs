//! # agentgraph-cli
//!
//! The `agentgraph` binary walks through the engine one flow at a time:
//!
//! | Subcommand | Graph |
//! |------------|-------|
//! | `chat`     | `__start__ → chatbot → __end__` |
//! | `tools`    | chatbot looping through a calculator `ToolNode` |
//! | `react`    | prebuilt ReAct travel advisor hosted as a subgraph |
//! | `memory`   | chatbot with a checkpoint store, two turns of one session |
//! | `handoff`  | travel and hotel advisors handing off to each other |
//!
//! The collaborator comes from the environment, see [`llm::from_env`].

pub mod cli;
pub mod demo_tools;
pub mod flows;

pub use cli::{Cli, Commands};
