//! Executable graphs
//!
//! A [`CompiledGraph`] is the immutable product of
//! [`StateGraph::compile`](crate::StateGraph::compile). It is cheap to
//! clone and can run any number of independent sessions concurrently.
//!
//! ```text
//!            invoke / stream / start
//!                     │
//!   READY ──▶ RUNNING ─┼─▶ TERMINATED   (reached END)
//!                ▲     ├─▶ SUSPENDED    (interrupt before a node)
//!                │     └─▶ FAILED       (taxonomy error, tagged node + step)
//!                └──────── resume (no input) ◀── SUSPENDED
//! ```
//!
//! Each step executes one node, merges its update, writes a checkpoint when
//! a store and session are configured, then routes to the next node.

mod execution;
mod graph;
mod state;
mod streaming;
mod types;

pub use execution::Execution;
pub use graph::{CompiledGraph, DEFAULT_STEP_BUDGET};
pub use types::{EventStream, RunConfig, RunOutcome, RunStatus, StateSnapshot, StreamEvent, StreamMode};
