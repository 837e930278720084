//! The step loop
//!
//! An [`Execution`] owns a stack of engine frames. The bottom frame runs
//! the compiled graph itself; each subgraph node that starts pushes a frame
//! for the nested graph, which is popped again when the nested graph
//! reaches END or hands off to its parent.
//!
//! ```text
//!  stack
//!  ┌──────────────────────────┐
//!  │ frame 1: "hotel_advisor" │  ◀── running node "tools"
//!  ├──────────────────────────┤
//!  │ frame 0: root graph      │  cursor: Goto("hotel_advisor")
//!  └──────────────────────────┘
//! ```
//!
//! Only root-frame steps are step boundaries: checkpoints and stream events
//! are produced there, so a session always resumes outside any subgraph.

use super::graph::CompiledGraph;
use super::types::{RunConfig, RunOutcome, RunStatus, StreamEvent, StreamMode};
use crate::error::{GraphError, Result};
use crate::graph::{NodeFn, NodeId, NodeKind, END, START};
use crate::handoff::HandoffScope;
use crate::node_result::NodeResult;
use crate::state::State;
use agentgraph_checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::Instrument;

/// Position of a frame between two nodes
#[derive(Debug, Clone, PartialEq)]
enum Cursor {
    /// Ask the edge table where to go after this node
    Route(NodeId),
    /// Already decided
    Goto(NodeId),
}

struct Frame {
    graph: CompiledGraph,
    /// Name of the subgraph node in the parent frame, `None` for the root
    node: Option<NodeId>,
    entry: State,
    state: State,
    cursor: Cursor,
}

/// One run of a compiled graph.
///
/// Created by [`CompiledGraph::start`]; drive it with [`run`](Self::run).
/// A suspended execution resumes when `run` is called again.
pub struct Execution {
    graph: CompiledGraph,
    session_id: Option<String>,
    stack: Vec<Frame>,
    status: RunStatus,
    step: u64,
    executed: usize,
    budget: usize,
    skip_interrupt: bool,
    events: Option<(StreamMode, mpsc::Sender<Result<StreamEvent>>)>,
}

impl CompiledGraph {
    /// Run to completion on a fresh, unpersisted state
    pub async fn invoke(&self, input: Value) -> Result<State> {
        self.invoke_with_config(Some(input), RunConfig::default()).await
    }

    /// Run with session settings.
    ///
    /// With a checkpoint store and a session id, an existing checkpoint is
    /// resumed: new `input` starts a new turn from START on top of the
    /// restored state, no input continues where the session stopped.
    #[tracing::instrument(skip(self, input, config), fields(graph = %self.name, session = ?config.session_id))]
    pub async fn invoke_with_config(&self, input: Option<Value>, config: RunConfig) -> Result<State> {
        let mut execution = self.start(input, config).await?;
        Ok(execution.run().await?.state)
    }

    /// Prepare a run without executing any node
    pub async fn start(&self, input: Option<Value>, config: RunConfig) -> Result<Execution> {
        let restored = match (&self.checkpointer, &config.session_id) {
            (Some(store), Some(session)) => store.load(session).await?,
            _ => None,
        };

        let mut step = 0;
        let mut skip_interrupt = false;
        let (state, cursor) = match (restored, input) {
            (None, input) => {
                let input = input.unwrap_or_else(|| json!({}));
                (State::from_input(&input)?, Cursor::Route(START.to_string()))
            }
            (Some(checkpoint), Some(input)) => {
                tracing::debug!(step = checkpoint.step, "new turn on restored session");
                step = checkpoint.step;
                let state = State::try_from(checkpoint.state)?.merge(&input)?;
                (state, Cursor::Route(START.to_string()))
            }
            (Some(checkpoint), None) => {
                tracing::debug!(step = checkpoint.step, "resuming session from checkpoint");
                step = checkpoint.step;
                skip_interrupt = checkpoint.metadata.interrupted;
                let cursor = match (checkpoint.metadata.next, checkpoint.metadata.node) {
                    (Some(next), _) => Cursor::Goto(next),
                    (None, Some(node)) => Cursor::Route(node),
                    (None, None) => Cursor::Route(START.to_string()),
                };
                (State::try_from(checkpoint.state)?, cursor)
            }
        };

        Ok(Execution {
            graph: self.clone(),
            session_id: config.session_id,
            stack: vec![Frame {
                graph: self.clone(),
                node: None,
                entry: state.clone(),
                state,
                cursor,
            }],
            status: RunStatus::Ready,
            step,
            executed: 0,
            budget: config.step_budget.unwrap_or(self.step_budget),
            skip_interrupt,
            events: None,
        })
    }
}

impl Execution {
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Current root state
    pub fn state(&self) -> Option<&State> {
        self.stack.first().map(|frame| &frame.state)
    }

    /// Session step counter
    pub fn step(&self) -> u64 {
        self.step
    }

    pub(crate) fn with_events(mut self, mode: StreamMode, tx: mpsc::Sender<Result<StreamEvent>>) -> Self {
        self.events = Some((mode, tx));
        self
    }

    /// Drive the run until it terminates, suspends or fails
    pub async fn run(&mut self) -> Result<RunOutcome> {
        match self.status {
            RunStatus::Terminated => return Ok(self.outcome(None)),
            RunStatus::Failed => {
                return Err(GraphError::Validation(
                    "execution already failed; start a new one".to_string(),
                ))
            }
            RunStatus::Suspended => self.skip_interrupt = true,
            RunStatus::Ready | RunStatus::Running => {}
        }

        self.status = RunStatus::Running;
        match self.drive().await {
            Ok(next) => Ok(self.outcome(next)),
            Err(e) => {
                self.status = RunStatus::Failed;
                tracing::error!(error = %e, "run failed");
                Err(e)
            }
        }
    }

    fn outcome(&self, next: Option<NodeId>) -> RunOutcome {
        RunOutcome {
            state: self.state().cloned().unwrap_or_default(),
            status: self.status,
            step: self.step,
            next,
        }
    }

    /// Returns the node the run suspended before, if any
    async fn drive(&mut self) -> Result<Option<NodeId>> {
        loop {
            let depth = self.stack.len();
            let step = self.step;
            let frame = self
                .stack
                .last_mut()
                .ok_or_else(|| GraphError::Validation("execution has no frame".to_string()))?;

            let next = match &frame.cursor {
                Cursor::Goto(node) => node.clone(),
                Cursor::Route(from) => frame
                    .graph
                    .edges
                    .resolve(from, &frame.state)
                    .map_err(|e| e.in_run(from.clone(), step))?,
            };

            if next == END {
                if depth == 1 {
                    self.status = RunStatus::Terminated;
                    tracing::info!(step = self.step, executed = self.executed, "run terminated");
                    return Ok(None);
                }
                self.finish_subgraph().await?;
                continue;
            }

            frame.cursor = Cursor::Goto(next.clone());
            if self.events.as_ref().is_some_and(|(_, tx)| tx.is_closed()) {
                self.status = RunStatus::Suspended;
                tracing::info!(node = %next, step = self.step, "stream receiver dropped; run stopped");
                return Ok(Some(next));
            }
            if depth == 1 && !self.skip_interrupt && self.graph.interrupt_before.contains(&next) {
                self.suspend(&next).await?;
                return Ok(Some(next));
            }
            self.skip_interrupt = false;

            let kind = frame
                .graph
                .nodes
                .get(&next)
                .map_err(|e| e.in_run(next.clone(), step))?
                .kind
                .clone();

            match kind {
                NodeKind::Subgraph(subgraph) => {
                    // a subgraph entry is a step of its own
                    if self.executed >= self.budget {
                        return Err(GraphError::StepBudgetExceeded { limit: self.budget }.in_run(next, step));
                    }
                    self.executed += 1;
                    tracing::debug!(node = %next, subgraph = %subgraph.name(), "entering subgraph");
                    let state = frame.state.clone();
                    self.stack.push(Frame {
                        graph: subgraph,
                        node: Some(next),
                        entry: state.clone(),
                        state,
                        cursor: Cursor::Route(START.to_string()),
                    });
                }
                NodeKind::Function(func) => self.run_node(next, func).await?,
            }
        }
    }

    async fn run_node(&mut self, name: NodeId, func: NodeFn) -> Result<()> {
        if self.executed >= self.budget {
            return Err(GraphError::StepBudgetExceeded { limit: self.budget }.in_run(name, self.step));
        }
        self.executed += 1;
        self.step += 1;
        let step = self.step;
        let depth = self.stack.len();
        let timeout = self.graph.node_timeout;

        let input = match self.stack.last() {
            Some(frame) => frame.state.clone(),
            None => return Err(GraphError::Validation("execution has no frame".to_string())),
        };

        let span = tracing::info_span!("node", node = %name, step, depth);
        let fut = func(input).instrument(span);
        let result = match timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(GraphError::Timeout {
                    node: name.clone(),
                    duration_ms: limit.as_millis() as u64,
                }),
            },
            None => fut.await,
        }
        .map_err(|e| e.in_run(name.clone(), step))?;

        let tag = |e: GraphError| e.in_run(name.clone(), step);
        let frame = self
            .stack
            .last_mut()
            .ok_or_else(|| GraphError::Validation("execution has no frame".to_string()))?;

        match result {
            NodeResult::Update(update) => {
                frame.state = frame.state.merge(&update).map_err(tag)?;
                frame.cursor = Cursor::Route(name.clone());
                self.after_step(&name, update).await.map_err(tag)?;
            }
            NodeResult::Handoff(handoff) => {
                if let Some(update) = &handoff.update {
                    frame.state = frame.state.merge(update).map_err(tag)?;
                }
                let update = handoff.update.clone().unwrap_or_else(|| json!({}));
                tracing::debug!(from = %name, to = %handoff.goto, scope = ?handoff.scope, "handoff");

                match handoff.scope {
                    HandoffScope::Current => {
                        ensure_target(&frame.graph, &handoff.goto).map_err(tag)?;
                        frame.cursor = Cursor::Goto(handoff.goto);
                        self.after_step(&name, update).await.map_err(tag)?;
                    }
                    HandoffScope::Parent => {
                        if depth == 1 {
                            return Err(tag(GraphError::Routing {
                                node: name.clone(),
                                label: handoff.goto,
                            }));
                        }
                        let child = self
                            .stack
                            .pop()
                            .ok_or_else(|| GraphError::Validation("execution has no frame".to_string()))?;
                        let parent = self
                            .stack
                            .last_mut()
                            .ok_or_else(|| GraphError::Validation("subgraph frame without parent".to_string()))?;
                        ensure_target(&parent.graph, &handoff.goto).map_err(tag)?;

                        let delta = child.state.delta_since(&child.entry).map_err(tag)?;
                        parent.state = parent.state.merge(&delta).map_err(tag)?;
                        parent.cursor = Cursor::Goto(handoff.goto);

                        let subgraph_node = child.node.unwrap_or_default();
                        self.after_step(&subgraph_node, delta).await.map_err(tag)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Pop a finished subgraph frame and fold its contribution into the parent
    async fn finish_subgraph(&mut self) -> Result<()> {
        let step = self.step;
        let child = self
            .stack
            .pop()
            .ok_or_else(|| GraphError::Validation("execution has no frame".to_string()))?;
        let subgraph_node = child.node.clone().unwrap_or_default();
        let tag = |e: GraphError| e.in_run(subgraph_node.clone(), step);

        let parent = self
            .stack
            .last_mut()
            .ok_or_else(|| tag(GraphError::Validation("subgraph frame without parent".to_string())))?;
        let delta = child.state.delta_since(&child.entry).map_err(tag)?;
        parent.state = parent.state.merge(&delta).map_err(tag)?;
        parent.cursor = Cursor::Route(subgraph_node.clone());
        tracing::debug!(node = %subgraph_node, "subgraph finished");

        self.after_step(&subgraph_node, delta).await.map_err(tag)
    }

    /// Step boundary bookkeeping; only the root frame persists and emits
    async fn after_step(&mut self, node: &str, update: Value) -> Result<()> {
        if self.stack.len() != 1 {
            return Ok(());
        }
        let frame = &self.stack[0];

        if let (Some(store), Some(session)) = (&self.graph.checkpointer, &self.session_id) {
            let mut metadata = CheckpointMetadata::new()
                .with_source(CheckpointSource::Loop)
                .with_node(node);
            if let Cursor::Goto(next) = &frame.cursor {
                metadata = metadata.with_next(next.clone());
            }
            let checkpoint =
                Checkpoint::new(session.clone(), frame.state.to_value()?, self.step).with_metadata(metadata);
            store.put(checkpoint).await?;
            tracing::debug!(session = %session, step = self.step, node, "checkpoint saved");
        }

        let event = match self.events.as_ref().map(|(mode, _)| *mode) {
            Some(StreamMode::Values) => Some(StreamEvent::Values(frame.state.clone())),
            Some(StreamMode::Updates) => Some(StreamEvent::Updates {
                node: node.to_string(),
                update,
            }),
            None => None,
        };
        if let Some(event) = event {
            self.emit(event).await;
        }
        Ok(())
    }

    async fn suspend(&mut self, next: &str) -> Result<()> {
        self.status = RunStatus::Suspended;
        tracing::info!(node = next, step = self.step, "run suspended before node");

        if let (Some(store), Some(session)) = (&self.graph.checkpointer, &self.session_id) {
            let source = if self.executed == 0 {
                CheckpointSource::Input
            } else {
                CheckpointSource::Loop
            };
            let metadata = CheckpointMetadata::new()
                .with_source(source)
                .with_next(next)
                .with_interrupted(true);
            let state = self.stack[0].state.to_value()?;
            let checkpoint = Checkpoint::new(session.clone(), state, self.step).with_metadata(metadata);
            store
                .put(checkpoint)
                .await
                .map_err(|e| GraphError::from(e).in_run(next, self.step))?;
        }

        self.emit(StreamEvent::Suspended {
            next: next.to_string(),
        })
        .await;
        Ok(())
    }

    async fn emit(&self, event: StreamEvent) {
        if let Some((_, tx)) = &self.events {
            if tx.send(Ok(event)).await.is_err() {
                tracing::debug!("stream receiver dropped; event discarded");
            }
        }
    }
}

fn ensure_target(graph: &CompiledGraph, target: &str) -> Result<()> {
    if target == END || graph.nodes.contains(target) {
        Ok(())
    } else {
        Err(GraphError::UnknownNode {
            node: target.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateGraph;
    use crate::handoff::Handoff;
    use crate::messages::Message;
    use agentgraph_checkpoint::{CheckpointStore, InMemoryCheckpointStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn say(text: &'static str) -> impl Fn(State) -> futures::future::BoxFuture<'static, Result<NodeResult>> + Send + Sync {
        move |_state| {
            Box::pin(async move { Ok(json!({"messages": [Message::assistant(text)]}).into()) })
        }
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let mut graph = StateGraph::new();
        graph.add_node("a", say("hi")).unwrap();
        graph.add_edge(START, "a").add_edge("a", END);
        let app = graph.compile().unwrap();

        let mut execution = app.start(Some(json!({"messages": ["q"]})), RunConfig::new()).await.unwrap();
        assert_eq!(execution.status(), RunStatus::Ready);

        let outcome = execution.run().await.unwrap();
        assert_eq!(outcome.status, RunStatus::Terminated);
        assert_eq!(execution.status(), RunStatus::Terminated);
        assert_eq!(outcome.step, 1);

        // running a terminated execution is a no-op
        let again = execution.run().await.unwrap();
        assert_eq!(again.state, outcome.state);
    }

    #[tokio::test]
    async fn test_failed_execution_cannot_rerun() {
        let mut graph = StateGraph::new();
        graph
            .add_node("bad", |_state| async { Ok(json!("not a mapping").into()) })
            .unwrap();
        graph.add_edge(START, "bad").add_edge("bad", END);
        let app = graph.compile().unwrap();

        let mut execution = app.start(None, RunConfig::new()).await.unwrap();
        let err = execution.run().await.unwrap_err();
        assert!(matches!(err.root(), GraphError::InvalidMerge(_)));
        assert_eq!(err.location(), Some(("bad", 1)));
        assert_eq!(execution.status(), RunStatus::Failed);
        assert!(execution.run().await.is_err());
    }

    #[tokio::test]
    async fn test_node_timeout() {
        let mut graph = StateGraph::new();
        graph
            .add_node("slow", |_state| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(NodeResult::empty())
            })
            .unwrap();
        graph.add_edge(START, "slow").add_edge("slow", END);
        let app = graph.compile().unwrap().with_node_timeout(Duration::from_millis(20));

        let err = app.invoke(json!({})).await.unwrap_err();
        assert!(matches!(err.root(), GraphError::Timeout { node, .. } if node == "slow"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_current_scope_handoff_bypasses_edges() {
        let mut graph = StateGraph::new();
        graph
            .add_node("router", |_state| async {
                Ok(Handoff::to("b").with_update(json!({"picked": "b"})).into())
            })
            .unwrap();
        graph.add_node("a", say("from a")).unwrap();
        graph.add_node("b", say("from b")).unwrap();
        graph
            .add_edge(START, "router")
            .add_edge("router", "a")
            .add_edge("a", END)
            .add_edge("b", END);
        let app = graph.compile().unwrap();

        let state = app.invoke(json!({})).await.unwrap();
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].text(), Some("from b"));
        assert_eq!(state.get("picked"), Some(&json!("b")));
    }

    #[tokio::test]
    async fn test_handoff_to_unknown_node() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", |_state| async { Ok(Handoff::to("nowhere").into()) })
            .unwrap();
        graph.add_edge(START, "a").add_edge("a", END);
        let app = graph.compile().unwrap();

        let err = app.invoke(json!({})).await.unwrap_err();
        assert!(matches!(err.root(), GraphError::UnknownNode { node } if node == "nowhere"));
        assert_eq!(err.location(), Some(("a", 1)));
    }

    #[tokio::test]
    async fn test_parent_handoff_from_root_is_routing_error() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", |_state| async { Ok(Handoff::to_parent("x").into()) })
            .unwrap();
        graph.add_edge(START, "a").add_edge("a", END);
        let app = graph.compile().unwrap();

        let err = app.invoke(json!({})).await.unwrap_err();
        assert!(matches!(err.root(), GraphError::Routing { .. }));
    }

    #[tokio::test]
    async fn test_subgraph_contributes_delta() {
        let mut inner = StateGraph::new().with_name("inner");
        inner.add_node("one", say("one")).unwrap();
        inner.add_node("two", say("two")).unwrap();
        inner
            .add_edge(START, "one")
            .add_edge("one", "two")
            .add_edge("two", END);

        let mut outer = StateGraph::new();
        outer.add_subgraph("nested", inner.compile().unwrap()).unwrap();
        outer.add_node("after", say("after")).unwrap();
        outer
            .add_edge(START, "nested")
            .add_edge("nested", "after")
            .add_edge("after", END);
        let store = Arc::new(InMemoryCheckpointStore::new());
        let app = outer.compile().unwrap().with_checkpointer(store.clone());

        let state = app
            .invoke_with_config(Some(json!({"messages": ["go"]})), RunConfig::new().with_session("s"))
            .await
            .unwrap();
        let texts: Vec<_> = state.messages.iter().map(|m| m.text().unwrap()).collect();
        assert_eq!(texts, vec!["go", "one", "two", "after"]);

        // subgraph steps count toward the session step counter
        let checkpoint = store.load("s").await.unwrap().unwrap();
        assert_eq!(checkpoint.step, 3);
        assert_eq!(checkpoint.metadata.node.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn test_step_budget_override() {
        let mut graph = StateGraph::new();
        graph.add_node("a", say("a")).unwrap();
        graph.add_node("b", say("b")).unwrap();
        graph.add_edge(START, "a").add_edge("a", "b").add_edge("b", END);
        let app = graph.compile().unwrap();

        let mut execution = app
            .start(None, RunConfig::new().with_step_budget(1))
            .await
            .unwrap();
        let err = execution.run().await.unwrap_err();
        assert!(matches!(err.root(), GraphError::StepBudgetExceeded { limit: 1 }));
        assert_eq!(err.location(), Some(("b", 1)));
    }
}
