//! Shared conversation state and the merge rule
//!
//! [`State`] is the single value threaded through a graph run. It has one
//! required field, `messages`, plus any number of auxiliary keys:
//!
//! ```json
//! {
//!   "messages": [ {"role": "user", "content": "What is 2 + 2?"} ],
//!   "remaining_steps": 9
//! }
//! ```
//!
//! Nodes never mutate the state; they return a partial update which the
//! engine folds in with [`merge`]:
//!
//! - `messages` is **appended** to the existing log (never reordered,
//!   never truncated)
//! - every other key is **overwritten** (last write wins)
//!
//! ```rust
//! use agentgraph_core::state::{merge, State};
//! use serde_json::json;
//!
//! let state = State::from_input(&json!({"messages": [["user", "hi"]], "mood": "ok"})).unwrap();
//! let next = merge(&state, &json!({"messages": [["assistant", "hello"]], "mood": "great"})).unwrap();
//!
//! assert_eq!(next.messages.len(), 2);
//! assert_eq!(next.get("mood"), Some(&json!("great")));
//! ```

use crate::error::{GraphError, Result};
use crate::messages::{coerce_message, Message};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the conversation log
pub const MESSAGES_KEY: &str = "messages";

/// Conversation log plus auxiliary values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            values: Map::new(),
        }
    }

    /// Build a state from loosely-typed input (message-like entries allowed)
    pub fn from_input(input: &Value) -> Result<Self> {
        merge(&Self::default(), input)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Fold `update` into this state, see [`merge`]
    pub fn merge(&self, update: &Value) -> Result<Self> {
        merge(self, update)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// What this state added on top of `base`: appended messages and
    /// auxiliary values that differ
    pub fn delta_since(&self, base: &State) -> Result<Value> {
        let mut delta = Map::new();
        let appended = self
            .messages
            .iter()
            .skip(base.messages.len())
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        if !appended.is_empty() {
            delta.insert(MESSAGES_KEY.to_string(), Value::Array(appended));
        }
        for (key, value) in &self.values {
            if base.values.get(key) != Some(value) {
                delta.insert(key.clone(), value.clone());
            }
        }
        Ok(Value::Object(delta))
    }
}

impl TryFrom<Value> for State {
    type Error = GraphError;

    fn try_from(value: Value) -> Result<Self> {
        State::from_input(&value)
    }
}

/// Merge a partial update into `current`, producing a new state.
///
/// Fails with [`GraphError::InvalidMerge`] when `update` is not a JSON
/// object or when its `messages` entry holds something that is not a
/// message. `current` is never modified.
pub fn merge(current: &State, update: &Value) -> Result<State> {
    let Value::Object(fields) = update else {
        return Err(GraphError::InvalidMerge(format!(
            "update must be a mapping, got {}",
            type_name(update)
        )));
    };

    let mut next = current.clone();
    for (key, value) in fields {
        if key == MESSAGES_KEY {
            next.messages.extend(coerce_messages(value)?);
        } else {
            next.values.insert(key.clone(), value.clone());
        }
    }
    Ok(next)
}

fn coerce_messages(value: &Value) -> Result<Vec<Message>> {
    match value {
        Value::Array(items) => items.iter().map(coerce_message).collect(),
        Value::Null => Err(GraphError::InvalidMerge(
            "'messages' must be a sequence of messages, got null".to_string(),
        )),
        single => Ok(vec![coerce_message(single)?]),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
