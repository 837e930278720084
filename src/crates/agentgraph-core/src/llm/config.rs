//! Request configuration for chat calls

use crate::llm::tools::ToolDefinition;
use crate::messages::Message;

/// A chat call: conversation plus sampling settings
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub config: ChatConfig,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn with_stop_sequences(mut self, sequences: Vec<String>) -> Self {
        self.config.stop_sequences = sequences;
        self
    }
}

/// Sampling settings and bound tools
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub stop_sequences: Vec<String>,
    pub tools: Vec<ToolDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new(vec![Message::user("test")])
            .with_temperature(0.0)
            .with_max_tokens(100)
            .with_tools(vec![ToolDefinition::new("add", "Adds two numbers")]);

        assert_eq!(request.config.temperature, Some(0.0));
        assert_eq!(request.config.max_tokens, Some(100));
        assert_eq!(request.config.tools.len(), 1);
        assert!(request.config.stop_sequences.is_empty());
    }
}
