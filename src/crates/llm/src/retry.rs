//! Retry wrapper for any chat model

use agentgraph_core::error::Result;
use agentgraph_core::llm::{ChatModel, ChatRequest, ChatResponse, ToolDefinition};
use async_trait::async_trait;
use std::sync::Arc;
use tooling::async_utils::{with_retry_if, RetryPolicy};

/// Retries calls that fail with a retryable collaborator error.
///
/// Permanent failures (bad key, malformed request) surface on the first
/// attempt.
#[derive(Clone)]
pub struct RetryingChatModel {
    inner: Arc<dyn ChatModel>,
    policy: RetryPolicy,
}

impl RetryingChatModel {
    pub fn new(inner: Arc<dyn ChatModel>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl ChatModel for RetryingChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        with_retry_if(
            &self.policy,
            || self.inner.chat(request.clone()),
            |e| e.is_retryable(),
        )
        .await
    }

    async fn is_available(&self) -> Result<bool> {
        self.inner.is_available().await
    }

    fn bound_tools(&self) -> Vec<ToolDefinition> {
        self.inner.bound_tools()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentgraph_core::llm::ScriptedChatModel;
    use agentgraph_core::{GraphError, Message};

    fn fast(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(attempts).with_initial_interval(0.001).with_jitter(false)
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let scripted = Arc::new(ScriptedChatModel::new(vec![]));
        scripted.push_error("503 unavailable", true);
        scripted.push(Message::assistant("4"));
        let model = RetryingChatModel::new(scripted.clone(), fast(3));

        let reply = model.generate(vec![Message::user("2 + 2?")], &[]).await.unwrap();
        assert_eq!(reply.text(), Some("4"));
        assert_eq!(scripted.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let scripted = Arc::new(ScriptedChatModel::new(vec![]));
        scripted.push_error("401 unauthorized", false);
        scripted.push(Message::assistant("unreachable"));
        let model = RetryingChatModel::new(scripted.clone(), fast(3));

        let err = model.generate(vec![Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, GraphError::Collaborator { retryable: false, .. }));
        assert_eq!(scripted.remaining(), 1);
    }
}
