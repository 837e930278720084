//! Tool definitions and the tool invocation adapter
//!
//! A [`Tool`] is a named async function over a JSON arguments object. Tools
//! live in a [`ToolRegistry`]; the adapter
//! [`execute_pending_tool_calls`] runs every tool call requested by an
//! assistant message and turns each outcome into a tool-result
//! [`Message`]:
//!
//! ```text
//! assistant { tool_calls: [add(2, 2) #c1, square(3) #c2] }
//!        │
//!        ├─ add    ──▶ tool "4"  (tool_call_id c1)
//!        └─ square ──▶ tool "9"  (tool_call_id c2)
//! ```
//!
//! Calls run concurrently and results come back in call order. A tool that
//! fails, including one whose arguments cannot be coerced into its declared
//! parameter type, still yields a tool-result message; only a call naming
//! an unregistered tool is an error ([`GraphError::UnknownTool`]).
//!
//! # Typed tools
//!
//! ```rust
//! use agentgraph_core::tool::{FnTool, ToolError};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct AddArgs {
//!     a: i64,
//!     b: i64,
//! }
//!
//! let add = FnTool::new("add", "Adds a and b.", |args: AddArgs| async move {
//!     Ok::<_, ToolError>(args.a + args.b)
//! })
//! .with_parameters(json!({
//!     "type": "object",
//!     "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
//!     "required": ["a", "b"]
//! }));
//! ```

use crate::error::{GraphError, Result};
use crate::handoff::Handoff;
use crate::llm::ToolDefinition;
use crate::messages::{Message, ToolCall};
use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Failure inside a tool. Never escapes the adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// Arguments do not match the declared parameters
    #[error("invalid arguments for tool '{tool}': {error}")]
    InvalidArguments { tool: String, error: String },

    /// The tool body failed
    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    pub fn execution(error: impl std::fmt::Display) -> Self {
        ToolError::Execution(error.to_string())
    }
}

/// Outcome of invoking one tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    /// Plain tool-result message
    Message(Message),

    /// Tool-result message plus a control transfer
    Handoff { message: Message, handoff: Handoff },
}

impl ToolInvocation {
    pub fn message(&self) -> &Message {
        match self {
            ToolInvocation::Message(message) => message,
            ToolInvocation::Handoff { message, .. } => message,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            ToolInvocation::Message(message) => message,
            ToolInvocation::Handoff { message, .. } => message,
        }
    }
}

/// A callable tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object
    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    /// Run the tool on raw arguments
    async fn execute(&self, args: Value) -> std::result::Result<Value, ToolError>;

    /// Spec advertised to the collaborator
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description()).with_parameters(self.parameters())
    }

    /// Answer one tool call. Failures become error tool messages.
    async fn invoke(&self, call: &ToolCall) -> ToolInvocation {
        let schema = self.parameters();
        let args = coerce_args(&schema, &call.args);
        let outcome = match validate_args(self.name(), &schema, &args) {
            Ok(()) => self.execute(args).await,
            Err(e) => Err(e),
        };
        let message = match outcome {
            Ok(value) => success_message(self.name(), call, value),
            Err(e) => {
                tracing::warn!(tool = self.name(), call_id = %call.id, error = %e, "tool call failed");
                error_message(self.name(), call, &e)
            }
        };
        ToolInvocation::Message(message)
    }
}

/// Tool-result message for a successful call
pub fn success_message(tool: &str, call: &ToolCall, value: Value) -> Message {
    let content = match value {
        Value::String(text) => text,
        other => other.to_string(),
    };
    Message::tool(content, call.id.clone()).with_name(tool)
}

/// Tool-result message describing a failed call
pub fn error_message(tool: &str, call: &ToolCall, error: &ToolError) -> Message {
    Message::tool(
        format!("Error: {error}\n Please fix your mistakes."),
        call.id.clone(),
    )
    .with_name(tool)
    .with_metadata(json!({"status": "error"}))
}

/// Convert string literals to the scalar type their property declares.
///
/// Models often quote numbers and booleans. Only properties whose schema
/// type is `integer`, `number` or `boolean` (and does not also allow
/// `string`) are touched; values that do not parse are left for
/// validation to report.
pub fn coerce_args(schema: &Value, args: &Value) -> Value {
    let (Some(properties), Some(object)) = (
        schema.get("properties").and_then(Value::as_object),
        args.as_object(),
    ) else {
        return args.clone();
    };

    let mut coerced = object.clone();
    for (key, value) in coerced.iter_mut() {
        let Some(text) = value.as_str() else { continue };
        let Some(declared) = properties.get(key).and_then(|p| p.get("type")) else {
            continue;
        };
        let allows = |ty: &str| match declared {
            Value::String(t) => t == ty,
            Value::Array(types) => types.iter().any(|t| t == ty),
            _ => false,
        };
        if allows("string") {
            continue;
        }

        let text = text.trim();
        let parsed = if allows("boolean") && (text == "true" || text == "false") {
            Some(Value::Bool(text == "true"))
        } else if allows("integer") && text.parse::<i64>().is_ok() {
            text.parse::<i64>().ok().map(Value::from)
        } else if allows("number") {
            parse_number(text)
        } else {
            None
        };
        if let Some(parsed) = parsed {
            *value = parsed;
        }
    }
    Value::Object(coerced)
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

/// Check `args` against a JSON Schema.
///
/// Arguments must always be an object; full schema checks need the
/// `json-validation` feature.
pub fn validate_args(
    tool: &str,
    schema: &Value,
    args: &Value,
) -> std::result::Result<(), ToolError> {
    if !args.is_object() {
        return Err(ToolError::InvalidArguments {
            tool: tool.to_string(),
            error: "arguments must be an object".to_string(),
        });
    }

    #[cfg(feature = "json-validation")]
    {
        use jsonschema::JSONSchema;

        let compiled = JSONSchema::compile(schema).map_err(|e| ToolError::InvalidArguments {
            tool: tool.to_string(),
            error: format!("invalid JSON Schema: {e}"),
        })?;
        let problems = match compiled.validate(args) {
            Ok(()) => None,
            Err(errors) => Some(
                errors
                    .map(|e| format!("{}: {}", e.instance_path, e))
                    .collect::<Vec<String>>(),
            ),
        };
        if let Some(problems) = problems {
            return Err(ToolError::InvalidArguments {
                tool: tool.to_string(),
                error: problems.join("; "),
            });
        }
    }

    #[cfg(not(feature = "json-validation"))]
    let _ = schema;

    Ok(())
}

type ToolFn = Arc<dyn Fn(Value) -> BoxFuture<'static, std::result::Result<Value, ToolError>> + Send + Sync>;

/// Tool backed by an async closure over a typed argument struct
#[derive(Clone)]
pub struct FnTool {
    name: String,
    description: String,
    parameters: Value,
    func: ToolFn,
}

impl FnTool {
    /// Arguments are deserialized into `A`; a mismatch is an
    /// `InvalidArguments` failure reported back as a tool message.
    pub fn new<A, R, F, Fut>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, ToolError>> + Send + 'static,
    {
        let name = name.into();
        let tool_name = name.clone();
        let func = Arc::new(func);
        let wrapped: ToolFn = Arc::new(move |args: Value| {
            let func = func.clone();
            let tool_name = tool_name.clone();
            Box::pin(async move {
                let typed: A = serde_json::from_value(args).map_err(|e| {
                    ToolError::InvalidArguments {
                        tool: tool_name.clone(),
                        error: e.to_string(),
                    }
                })?;
                let output = func(typed).await?;
                serde_json::to_value(output).map_err(ToolError::execution)
            })
        });

        Self {
            name,
            description: description.into(),
            parameters: json!({"type": "object", "properties": {}}),
            func: wrapped,
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("func", &"<function>")
            .finish()
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn execute(&self, args: Value) -> std::result::Result<Value, ToolError> {
        (self.func)(args).await
    }
}

/// Name → tool table
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register_arc(tool);
        }
        registry
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    /// Add a shared tool; a tool with the same name is replaced
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "replacing previously registered tool");
        } else {
            self.order.push(name);
        }
    }

    /// Look up a tool. Fails with `UnknownTool` if absent.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| GraphError::UnknownTool {
                tool: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Specs of all tools, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Invoke every tool call of `last_message`, keeping handoff signals.
///
/// All names are resolved before anything runs, so an unknown tool fails
/// the whole batch without side effects.
pub async fn invoke_pending_tool_calls(
    last_message: &Message,
    registry: &ToolRegistry,
) -> Result<Vec<ToolInvocation>> {
    let calls = last_message.tool_calls();
    let tools = calls
        .iter()
        .map(|call| registry.get(&call.name))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(count = calls.len(), "executing tool calls");
    let futures = tools
        .iter()
        .zip(calls)
        .map(|(tool, call)| async move { tool.invoke(call).await });
    Ok(join_all(futures).await)
}

/// Execute the pending tool calls of `last_message` into tool-result messages
pub async fn execute_pending_tool_calls(
    last_message: &Message,
    registry: &ToolRegistry,
) -> Result<Vec<Message>> {
    Ok(invoke_pending_tool_calls(last_message, registry)
        .await?
        .into_iter()
        .map(ToolInvocation::into_message)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Pair {
        a: i64,
        b: i64,
    }

    fn add() -> FnTool {
        FnTool::new("add", "Adds a and b.", |p: Pair| async move {
            Ok::<_, ToolError>(p.a + p.b)
        })
        .with_parameters(json!({
            "type": "object",
            "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
            "required": ["a", "b"]
        }))
    }

    fn failing() -> FnTool {
        FnTool::new("explode", "Always fails.", |_: Value| async move {
            Err::<Value, _>(ToolError::execution("boom"))
        })
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(add());
        registry.register(failing());
        registry
    }

    fn calls(calls: Vec<ToolCall>) -> Message {
        Message::assistant("").with_tool_calls(calls)
    }

    #[tokio::test]
    async fn test_success_becomes_tool_message() {
        let msg = calls(vec![ToolCall::new("c1", "add", json!({"a": 2, "b": 2}))]);
        let results = execute_pending_tool_calls(&msg, &registry()).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text(), Some("4"));
        assert_eq!(results[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(results[0].name.as_deref(), Some("add"));
        assert!(results[0].metadata.is_none());
    }

    #[tokio::test]
    async fn test_failure_becomes_error_message() {
        let msg = calls(vec![ToolCall::new("c1", "explode", json!({}))]);
        let results = execute_pending_tool_calls(&msg, &registry()).await.unwrap();

        assert_eq!(results[0].text(), Some("Error: boom\n Please fix your mistakes."));
        assert_eq!(results[0].metadata, Some(json!({"status": "error"})));
    }

    #[tokio::test]
    async fn test_bad_arguments_become_error_message() {
        let msg = calls(vec![ToolCall::new("c1", "add", json!({"a": "two", "b": 2}))]);
        let results = execute_pending_tool_calls(&msg, &registry()).await.unwrap();
        let text = results[0].text().unwrap();
        assert!(text.starts_with("Error: invalid arguments for tool 'add'"));

        let msg = calls(vec![ToolCall::new("c2", "add", json!([2, 2]))]);
        let results = execute_pending_tool_calls(&msg, &registry()).await.unwrap();
        assert!(results[0].text().unwrap().contains("must be an object"));
    }

    #[tokio::test]
    async fn test_quoted_numbers_are_coerced() {
        let msg = calls(vec![ToolCall::new("c1", "add", json!({"a": "2", "b": "2"}))]);
        let results = execute_pending_tool_calls(&msg, &registry()).await.unwrap();
        assert_eq!(results[0].text(), Some("4"));
    }

    #[test]
    fn test_coerce_args_follows_declared_types() {
        let schema = json!({
            "type": "object",
            "properties": {
                "count": {"type": "integer"},
                "ratio": {"type": "number"},
                "verbose": {"type": "boolean"},
                "label": {"type": "string"},
                "either": {"type": ["integer", "string"]}
            }
        });
        let args = json!({
            "count": " 7 ",
            "ratio": "0.5",
            "verbose": "false",
            "label": "12",
            "either": "3",
            "extra": "1"
        });
        assert_eq!(
            coerce_args(&schema, &args),
            json!({
                "count": 7,
                "ratio": 0.5,
                "verbose": false,
                "label": "12",
                "either": "3",
                "extra": "1"
            })
        );

        // unparseable values are left for validation
        assert_eq!(
            coerce_args(&schema, &json!({"count": "seven", "verbose": "yes"})),
            json!({"count": "seven", "verbose": "yes"})
        );
        assert_eq!(coerce_args(&schema, &json!([1])), json!([1]));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let msg = calls(vec![
            ToolCall::new("c1", "add", json!({"a": 1, "b": 1})),
            ToolCall::new("c2", "divide", json!({})),
        ]);
        let err = execute_pending_tool_calls(&msg, &registry()).await.unwrap_err();
        assert!(matches!(err, GraphError::UnknownTool { tool } if tool == "divide"));
    }

    #[tokio::test]
    async fn test_results_keep_call_order() {
        let msg = calls(vec![
            ToolCall::new("c1", "explode", json!({})),
            ToolCall::new("c2", "add", json!({"a": 1, "b": 2})),
            ToolCall::new("c3", "add", json!({"a": 3, "b": 4})),
        ]);
        let results = execute_pending_tool_calls(&msg, &registry()).await.unwrap();
        let ids: Vec<_> = results.iter().map(|m| m.tool_call_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(results[2].text(), Some("7"));
    }

    #[tokio::test]
    async fn test_no_tool_calls_yields_nothing() {
        let results = execute_pending_tool_calls(&Message::assistant("hi"), &registry())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_registry_definitions_in_order() {
        let registry = registry();
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["add", "explode"]);
        assert!(registry.contains("add"));
        assert!(registry.get("nope").is_err());
    }

    #[test]
    fn test_string_output_is_not_quoted() {
        let call = ToolCall::new("c", "t", json!({}));
        assert_eq!(success_message("t", &call, json!("aruba")).text(), Some("aruba"));
        assert_eq!(
            success_message("t", &call, json!(["Grace Bay Club"])).text(),
            Some("[\"Grace Bay Club\"]")
        );
    }
}
