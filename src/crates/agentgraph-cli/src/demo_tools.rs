//! Tools used by the walkthrough flows

use agentgraph_core::{FnTool, Tool, ToolError};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const DESTINATIONS: [&str; 2] = ["aruba", "turks and caicos"];

#[derive(Debug, Deserialize)]
struct Pair {
    a: i64,
    b: i64,
}

#[derive(Debug, Deserialize)]
struct Single {
    a: i64,
}

#[derive(Debug, Deserialize)]
struct Location {
    location: String,
}

fn pair_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
        "required": ["a", "b"]
    })
}

pub fn add() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new("add", "Add two numbers.", |p: Pair| async move {
            Ok::<_, ToolError>(p.a + p.b)
        })
        .with_parameters(pair_schema()),
    )
}

pub fn multiply() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new("multiply", "Multiply two numbers.", |p: Pair| async move {
            Ok::<_, ToolError>(p.a * p.b)
        })
        .with_parameters(pair_schema()),
    )
}

pub fn square() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new("square", "Calculates the square of a number.", |s: Single| async move {
            Ok::<_, ToolError>(s.a * s.a)
        })
        .with_parameters(json!({
            "type": "object",
            "properties": {"a": {"type": "integer"}},
            "required": ["a"]
        })),
    )
}

pub fn calculator() -> Vec<Arc<dyn Tool>> {
    vec![add(), multiply(), square()]
}

pub fn travel_recommendations() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "get_travel_recommendations",
        "Get recommendation for travel destinations",
        |_: Value| async move {
            let pick = DESTINATIONS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(DESTINATIONS[0]);
            Ok::<_, ToolError>(pick)
        },
    ))
}

pub fn hotel_recommendations() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "get_hotel_recommendations",
            "Get hotel recommendations for a given destination.",
            |args: Location| async move {
                let hotels: Vec<&str> = match args.location.as_str() {
                    // a single entry
                    "aruba" => vec!["The Ritz-Carlton, Aruba (Palm Beach)Bucuti & Tara Beach Resort (Eagle Beach)"],
                    "turks and caicos" => vec!["Grace Bay Club", "COMO Parrot Cay"],
                    other => return Err(ToolError::execution(format!("unknown destination '{other}'"))),
                };
                Ok(hotels)
            },
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {"location": {"type": "string", "enum": DESTINATIONS}},
            "required": ["location"]
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentgraph_core::{ToolCall, ToolInvocation};

    async fn run(tool: &Arc<dyn Tool>, args: Value) -> String {
        match tool.invoke(&ToolCall::new("c1", tool.name(), args)).await {
            ToolInvocation::Message(message) => message.content.as_text(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_calculator() {
        assert_eq!(run(&add(), json!({"a": 2, "b": 2})).await, "4");
        assert_eq!(run(&add(), json!({"a": "2", "b": "2"})).await, "4");
        assert_eq!(run(&multiply(), json!({"a": 3, "b": 4})).await, "12");
        assert_eq!(run(&square(), json!({"a": "5"})).await, "25");
        assert!(run(&square(), json!({"a": "five"})).await.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_travel_picks_known_destination() {
        let pick = run(&travel_recommendations(), json!({})).await;
        assert!(DESTINATIONS.contains(&pick.as_str()));
    }

    #[tokio::test]
    async fn test_hotels() {
        let aruba = run(&hotel_recommendations(), json!({"location": "aruba"})).await;
        assert_eq!(
            aruba,
            r#"["The Ritz-Carlton, Aruba (Palm Beach)Bucuti & Tara Beach Resort (Eagle Beach)"]"#
        );
        let err = run(&hotel_recommendations(), json!({"location": "mars"})).await;
        assert!(err.starts_with("Error: "));
    }
}
