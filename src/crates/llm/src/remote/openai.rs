//! OpenAI chat-completions client.
//!
//! Talks to api.openai.com (or any compatible server) with a bearer key, or
//! to an Azure OpenAI deployment with an `api-key` header. Tool definitions
//! are sent as `function` tools and `tool_calls` in the reply become
//! [`ToolCall`]s on the assistant message.
//!
//! # Example
//!
//! ```rust,ignore
//! use agentgraph_core::llm::ChatModel;
//! use agentgraph_core::Message;
//! use llm::{AzureOpenAiConfig, OpenAiClient};
//!
//! let client = OpenAiClient::azure(AzureOpenAiConfig::from_env()?)?;
//! let reply = client
//!     .generate(vec![Message::user("What is 2 + 2?")], &[add.definition()])
//!     .await?;
//! ```

use crate::config::{AzureOpenAiConfig, RemoteLlmConfig};
use crate::error::{LlmError, Result};
use agentgraph_core::error::Result as GraphResult;
use agentgraph_core::llm::{ChatModel, ChatRequest, ChatResponse, ToolDefinition, UsageMetadata};
use agentgraph_core::{Message, MessageRole, ToolCall};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Auth {
    Bearer {
        key: String,
        organization: Option<String>,
    },
    AzureKey(String),
}

/// Chat-completions client for OpenAI and Azure OpenAI
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    url: String,
    auth: Auth,
    /// Sent in the body; Azure routes by deployment instead
    model: Option<String>,
    temperature: Option<f32>,
    model_name: String,
}

impl OpenAiClient {
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            auth: Auth::Bearer {
                key: config.api_key,
                organization: config.organization,
            },
            model: Some(config.model.clone()),
            temperature: config.temperature,
            model_name: config.model,
        })
    }

    pub fn azure(config: AzureOpenAiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.chat_url(),
            auth: Auth::AzureKey(config.api_key.clone()),
            model: None,
            temperature: Some(config.temperature),
            model_name: config.deployment,
        })
    }

    /// Model or deployment name
    pub fn model(&self) -> &str {
        &self.model_name
    }

    fn build_body(&self, request: &ChatRequest) -> OpenAiRequest {
        let tools: Vec<OpenAiTool> = request.config.tools.iter().map(OpenAiTool::from).collect();
        OpenAiRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.config.temperature.or(self.temperature),
            max_tokens: request.config.max_tokens,
            stop: (!request.config.stop_sequences.is_empty())
                .then(|| request.config.stop_sequences.clone()),
            tool_choice: (!tools.is_empty()).then(|| "auto".to_string()),
            tools,
        }
    }

    async fn send(&self, body: &OpenAiRequest) -> Result<OpenAiResponse> {
        let mut req = self.client.post(&self.url).json(body);
        req = match &self.auth {
            Auth::Bearer { key, organization } => {
                let req = req.bearer_auth(key);
                match organization {
                    Some(org) => req.header("OpenAI-Organization", org),
                    None => req,
                }
            }
            Auth::AzureKey(key) => req.header("api-key", key),
        };

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), body));
        }
        response
            .json::<OpenAiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    #[tracing::instrument(skip(self, request), fields(model = %self.model_name, messages = request.messages.len()))]
    async fn chat(&self, request: ChatRequest) -> GraphResult<ChatResponse> {
        let body = self.build_body(&request);
        let reply = tooling::logging::timed("chat_completion", self.send(&body)).await?;
        Ok(convert_response(reply)?)
    }
}

fn convert_response(reply: OpenAiResponse) -> Result<ChatResponse> {
    let choice = reply
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            // arguments arrive as a JSON-encoded string
            let args = serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments));
            ToolCall::new(call.id, call.function.name, args)
        })
        .collect();

    let message = Message::assistant(choice.message.content.unwrap_or_default()).with_tool_calls(tool_calls);

    let mut metadata = HashMap::new();
    metadata.insert("model".to_string(), Value::String(reply.model));
    if let Some(reason) = choice.finish_reason {
        metadata.insert("finish_reason".to_string(), Value::String(reason));
    }

    let mut response = ChatResponse::new(message);
    response.metadata = metadata;
    if let Some(usage) = reply.usage {
        response = response.with_usage(UsageMetadata::new(usage.prompt_tokens, usage.completion_tokens));
    }
    Ok(response)
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        let tool_calls: Vec<OpenAiToolCall> = msg
            .tool_calls()
            .iter()
            .map(|call| OpenAiToolCall {
                id: call.id.clone(),
                kind: "function".to_string(),
                function: OpenAiFunctionCall {
                    name: call.name.clone(),
                    arguments: call.args.to_string(),
                },
            })
            .collect();
        let content = msg.content.as_text();

        OpenAiMessage {
            role: msg.role.as_str().to_string(),
            // assistant turns that only call tools carry null content
            content: if content.is_empty() && !tool_calls.is_empty() {
                None
            } else {
                Some(content)
            },
            // names are only meaningful for tool and user turns on this API
            name: match msg.role {
                MessageRole::Assistant | MessageRole::System => None,
                _ => msg.name.clone(),
            },
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunction,
}

impl From<&ToolDefinition> for OpenAiTool {
    fn from(def: &ToolDefinition) -> Self {
        OpenAiTool {
            kind: "function",
            function: OpenAiFunction {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def
                    .parameters
                    .clone()
                    .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAiFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}
