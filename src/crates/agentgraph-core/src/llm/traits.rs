//! The collaborator seam

use crate::error::Result;
use crate::llm::config::ChatRequest;
use crate::llm::response::ChatResponse;
use crate::llm::tools::ToolDefinition;
use crate::messages::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// A chat-completion provider.
///
/// Implementations report every failure as
/// [`GraphError::Collaborator`](crate::error::GraphError::Collaborator).
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one chat completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Cheap reachability check
    async fn is_available(&self) -> Result<bool> {
        Ok(true)
    }

    /// Tools attached to this model, sent when a request carries none
    fn bound_tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Produce the next assistant message for `messages`, offering `tools`
    async fn generate(&self, messages: Vec<Message>, tools: &[ToolDefinition]) -> Result<Message> {
        let request = ChatRequest::new(messages).with_tools(tools.to_vec());
        let response = self.chat(request).await?;
        if let Some(usage) = response.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "chat completion usage"
            );
        }
        Ok(response.message)
    }
}

/// A model with a fixed set of tools attached
#[derive(Clone)]
pub struct BoundChatModel {
    model: Arc<dyn ChatModel>,
    tools: Vec<ToolDefinition>,
}

impl BoundChatModel {
    pub fn new(model: Arc<dyn ChatModel>, tools: Vec<ToolDefinition>) -> Self {
        Self { model, tools }
    }
}

#[async_trait]
impl ChatModel for BoundChatModel {
    async fn chat(&self, mut request: ChatRequest) -> Result<ChatResponse> {
        if request.config.tools.is_empty() {
            request.config.tools = self.tools.clone();
        }
        self.model.chat(request).await
    }

    async fn is_available(&self) -> Result<bool> {
        self.model.is_available().await
    }

    fn bound_tools(&self) -> Vec<ToolDefinition> {
        self.tools.clone()
    }
}

/// Attach `tools` to `model`; requests that carry no tools get these
pub fn bind_tools(model: Arc<dyn ChatModel>, tools: Vec<ToolDefinition>) -> BoundChatModel {
    BoundChatModel::new(model, tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedChatModel;

    #[tokio::test]
    async fn test_generate_returns_reply_message() {
        let model = ScriptedChatModel::new(vec![Message::assistant("Hello!")]);
        let reply = model.generate(vec![Message::user("Hi")], &[]).await.unwrap();
        assert_eq!(reply.text(), Some("Hello!"));
        assert!(model.is_available().await.unwrap());
    }

    #[tokio::test]
    async fn test_bound_model_fills_in_tools() {
        let inner = Arc::new(ScriptedChatModel::new(vec![
            Message::assistant("a"),
            Message::assistant("b"),
        ]));
        let bound = bind_tools(inner.clone(), vec![ToolDefinition::new("add", "Adds")]);
        assert_eq!(bound.bound_tools().len(), 1);

        bound.generate(vec![Message::user("q")], &[]).await.unwrap();
        bound
            .generate(
                vec![Message::user("q")],
                &[ToolDefinition::new("square", "Squares")],
            )
            .await
            .unwrap();

        let requests = inner.requests();
        assert_eq!(requests[0].config.tools[0].name, "add");
        assert_eq!(requests[1].config.tools[0].name, "square");
    }
}
