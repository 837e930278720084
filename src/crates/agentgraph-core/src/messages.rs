//! Conversation messages
//!
//! A [`Message`] is one entry of the conversation log kept in
//! [`State::messages`](crate::state::State::messages). Messages are values:
//! once created they are never edited, only appended.
//!
//! # Roles
//!
//! | role        | produced by                         |
//! |-------------|-------------------------------------|
//! | `user`      | the end user (input)                |
//! | `assistant` | the LLM collaborator                |
//! | `tool`      | the tool adapter, answering a call  |
//! | `system`    | prompts prepended by agent nodes    |
//!
//! On input, `human` and `ai` are accepted as aliases for `user` and
//! `assistant`.
//!
//! # Message-like inputs
//!
//! Inputs and node updates may spell messages loosely; [`coerce_message`]
//! accepts all of these:
//!
//! ```json
//! {"role": "user", "content": "What is 2 + 2?"}
//! ["user", "What is 2 + 2?"]
//! "What is 2 + 2?"
//! ```

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role of the message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    #[serde(alias = "human")]
    User,
    #[serde(alias = "ai")]
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }

    fn banner_title(&self) -> &'static str {
        match self {
            Self::System => "System Message",
            Self::User => "Human Message",
            Self::Assistant => "Ai Message",
            Self::Tool => "Tool Message",
        }
    }
}

impl FromStr for MessageRole {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "user" | "human" => Ok(Self::User),
            "assistant" | "ai" => Ok(Self::Assistant),
            "tool" => Ok(Self::Tool),
            other => Err(GraphError::InvalidMerge(format!(
                "unknown message role '{other}'"
            ))),
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message payload: plain text or a structured JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Structured(Value),
}

impl MessageContent {
    /// Text view of the payload; structured content is rendered as JSON
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => value.to_string(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for MessageContent {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Structured(other),
        }
    }
}

/// A tool invocation requested by an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, echoed back by the tool-result message
    pub id: String,

    /// Registered tool name
    pub name: String,

    /// Arguments as a JSON object
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// One entry of the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub role: MessageRole,

    pub content: MessageContent,

    /// Tool name on tool messages, agent name on assistant messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Call id this message answers (tool messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<MessageContent>) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            role,
            content: content.into(),
            name: None,
            tool_calls: None,
            tool_call_id: None,
            metadata: None,
        }
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Alias for [`Message::user`]
    pub fn human(content: impl Into<MessageContent>) -> Self {
        Self::user(content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Alias for [`Message::assistant`]
    pub fn ai(content: impl Into<MessageContent>) -> Self {
        Self::assistant(content)
    }

    /// Tool-result message answering `tool_call_id`
    pub fn tool(content: impl Into<MessageContent>, tool_call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageRole::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        };
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Text content, if the payload is plain text
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Structured(_) => None,
        }
    }

    /// Assign a fresh id when missing
    pub fn ensure_id(&mut self) {
        if self.id.is_none() {
            self.id = Some(Uuid::new_v4().to_string());
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    pub fn is_tool(&self) -> bool {
        self.role == MessageRole::Tool
    }

    /// Tool calls requested by this message, empty when none
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    /// Render the message in a banner layout for terminals
    pub fn pretty(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!(" {} ", self.role.banner_title());
        writeln!(f, "{:=^80}", title)?;
        if let Some(name) = &self.name {
            writeln!(f, "Name: {name}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.content.as_text())?;
        if let Some(calls) = &self.tool_calls {
            write!(f, "\nTool Calls:")?;
            for call in calls {
                write!(f, "\n  {} ({})\n Call ID: {}\n  Args:", call.name, call.id, call.id)?;
                if let Value::Object(args) = &call.args {
                    for (key, value) in args {
                        write!(f, "\n    {key}: {value}")?;
                    }
                } else {
                    write!(f, "\n    {}", call.args)?;
                }
            }
        }
        Ok(())
    }
}

impl From<(MessageRole, &str)> for Message {
    fn from((role, content): (MessageRole, &str)) -> Self {
        Message::new(role, content)
    }
}

/// Interpret a message-like JSON value as a [`Message`].
///
/// Accepts a serialized message object, a `[role, content]` pair or a bare
/// string (treated as user input). Messages without an id get a fresh one.
pub fn coerce_message(value: &Value) -> Result<Message> {
    let mut message = match value {
        Value::String(text) => Message::user(text.as_str()),
        Value::Array(pair) if pair.len() == 2 => {
            let role = pair[0].as_str().ok_or_else(|| {
                GraphError::InvalidMerge(format!("message role must be a string, got {}", pair[0]))
            })?;
            Message::new(role.parse()?, pair[1].clone())
        }
        Value::Object(_) => serde_json::from_value(value.clone()).map_err(|e| {
            GraphError::InvalidMerge(format!("malformed message {value}: {e}"))
        })?,
        other => {
            return Err(GraphError::InvalidMerge(format!(
                "expected a message, got {other}"
            )))
        }
    };
    message.ensure_id();
    Ok(message)
}

/// Last assistant message of a conversation
pub fn last_assistant_message(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.is_assistant())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_aliases() {
        let msg: Message = serde_json::from_value(json!({"role": "human", "content": "hi"})).unwrap();
        assert_eq!(msg.role, MessageRole::User);
        let msg: Message = serde_json::from_value(json!({"role": "ai", "content": "yo"})).unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!("AI".parse::<MessageRole>().unwrap(), MessageRole::Assistant);
        assert!("robot".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let value = serde_json::to_value(Message::user("hi").with_id("m1")).unwrap();
        assert_eq!(value, json!({"id": "m1", "role": "user", "content": "hi"}));
    }

    #[test]
    fn test_tool_message_links_call() {
        let msg = Message::tool("4", "call_1").with_name("add");
        assert!(msg.is_tool());
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.text(), Some("4"));
    }

    #[test]
    fn test_structured_content_roundtrip() {
        let msg = Message::assistant(json!({"answer": 4}));
        assert_eq!(msg.text(), None);
        let back: Message = serde_json::from_value(serde_json::to_value(&msg).unwrap()).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_empty_tool_calls_are_dropped() {
        let msg = Message::assistant("done").with_tool_calls(vec![]);
        assert!(msg.tool_calls.is_none());
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_coerce_message_forms() {
        let pair = coerce_message(&json!(["user", "What is 2 + 2?"])).unwrap();
        assert_eq!(pair.role, MessageRole::User);
        assert_eq!(pair.text(), Some("What is 2 + 2?"));
        assert!(pair.id.is_some());

        let bare = coerce_message(&json!("hello")).unwrap();
        assert_eq!(bare.role, MessageRole::User);

        let object = coerce_message(&json!({"role": "assistant", "content": "4", "id": "a1"})).unwrap();
        assert_eq!(object.id.as_deref(), Some("a1"));

        assert!(matches!(
            coerce_message(&json!(42)),
            Err(GraphError::InvalidMerge(_))
        ));
        assert!(coerce_message(&json!(["wizard", "hi"])).is_err());
    }

    #[test]
    fn test_pretty_print_banner() {
        let msg = Message::assistant("")
            .with_tool_calls(vec![ToolCall::new("call_1", "add", json!({"a": 2, "b": 2}))]);
        let rendered = msg.pretty();
        assert!(rendered.starts_with("="));
        assert!(rendered.contains(" Ai Message "));
        assert!(rendered.contains("add (call_1)"));
        assert!(rendered.contains("a: 2"));
        assert_eq!(rendered.lines().next().unwrap().chars().count(), 80);
    }

    #[test]
    fn test_last_assistant_message() {
        let log = vec![
            Message::user("q"),
            Message::assistant("first"),
            Message::tool("r", "c"),
        ];
        assert_eq!(last_assistant_message(&log).unwrap().text(), Some("first"));
        assert!(last_assistant_message(&log[..1]).is_none());
    }
}
