use super::graph::CompiledGraph;
use super::types::{EventStream, RunConfig, StreamEvent, StreamMode};
use crate::error::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

impl CompiledGraph {
    /// Run in a background task, yielding an event after every root step.
    ///
    /// The stream ends when the run terminates or suspends; a failure is
    /// delivered as a final `Err` item. Dropping the stream stops the run
    /// before its next node.
    pub fn stream(&self, input: Option<Value>, config: RunConfig, mode: StreamMode) -> EventStream {
        // bounded for backpressure
        let (tx, rx) = mpsc::channel::<Result<StreamEvent>>(100);
        let graph = self.clone();

        tokio::spawn(async move {
            let execution = match graph.start(input, config).await {
                Ok(execution) => execution,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };
            let mut execution = execution.with_events(mode, tx.clone());
            if let Err(e) = execution.run().await {
                let _ = tx.send(Err(e)).await;
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateGraph;
    use crate::error::GraphError;
    use crate::graph::{END, START};
    use crate::messages::Message;
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn two_step_graph() -> CompiledGraph {
        let mut graph = StateGraph::new();
        graph
            .add_node("first", |_state| async {
                Ok(json!({"messages": [Message::assistant("1")]}).into())
            })
            .unwrap();
        graph
            .add_node("second", |_state| async { Ok(json!({"done": true}).into()) })
            .unwrap();
        graph
            .add_edge(START, "first")
            .add_edge("first", "second")
            .add_edge("second", END);
        graph.compile().unwrap()
    }

    #[tokio::test]
    async fn test_stream_updates() {
        let events: Vec<_> = two_step_graph()
            .stream(Some(json!({"messages": ["go"]})), RunConfig::new(), StreamMode::Updates)
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        match &events[0] {
            Ok(StreamEvent::Updates { node, update }) => {
                assert_eq!(node, "first");
                assert_eq!(update["messages"][0]["content"], json!("1"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            &events[1],
            Ok(StreamEvent::Updates { node, update }) if node == "second" && update == &json!({"done": true})
        ));
    }

    #[tokio::test]
    async fn test_stream_values() {
        let events: Vec<_> = two_step_graph()
            .stream(Some(json!({"messages": ["go"]})), RunConfig::new(), StreamMode::Values)
            .collect()
            .await;

        let lengths: Vec<usize> = events
            .iter()
            .map(|e| match e {
                Ok(StreamEvent::Values(state)) => state.messages.len(),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(lengths, vec![2, 2]);
    }

    #[tokio::test]
    async fn test_stream_reports_failure_last() {
        let mut graph = StateGraph::new();
        graph
            .add_node("ok", |_state| async { Ok(json!({}).into()) })
            .unwrap();
        graph
            .add_edge(START, "ok")
            .add_conditional_edge("ok", |_| "nowhere".to_string(), [("somewhere", END)]);
        let app = graph.compile().unwrap();

        let events: Vec<_> = app
            .stream(None, RunConfig::new(), StreamMode::Updates)
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        let err = events[1].as_ref().unwrap_err();
        assert!(matches!(err.root(), GraphError::Routing { label, .. } if label == "nowhere"));
    }

    #[tokio::test]
    async fn test_dropping_stream_stops_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut graph = StateGraph::new();
        graph
            .add_node("tick", move |_state| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    Ok(json!({}).into())
                }
            })
            .unwrap();
        graph.add_edge(START, "tick").add_edge("tick", "tick");
        let app = graph.compile().unwrap().with_step_budget(usize::MAX);

        let mut events = app.stream(None, RunConfig::new(), StreamMode::Updates);
        assert!(events.next().await.unwrap().is_ok());
        drop(events);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stopped_at = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), stopped_at);
    }
}
