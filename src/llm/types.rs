//! Provider-facing types shared by all LLM consumers

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the model may propose calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name as presented to the model
    pub name: String,
    /// What the tool does, for the model's benefit
    pub description: String,
    /// JSON schema of the tool's arguments
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool invocation proposed by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    /// Parsed arguments; shape depends on the tool's schema
    pub arguments: Value,
}

/// Outcome of a single propose-an-action call.
///
/// At most one tool call is ever consumed per turn; the agent dispatches on
/// this as a tagged variant, never looping back to the model.
#[derive(Debug, Clone)]
pub struct LlmDecision {
    /// Free-text reply, present when the model chose not to act
    pub text: Option<String>,
    /// Proposed tool invocation, if any
    pub tool_call: Option<ToolCall>,
}

impl LlmDecision {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_call: None,
        }
    }

    pub fn tool(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            text: None,
            tool_call: Some(ToolCall {
                name: name.into(),
                arguments,
            }),
        }
    }
}

/// A named JSON schema constraining a structured completion
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decision_constructors() {
        let d = LlmDecision::text("hello");
        assert_eq!(d.text.as_deref(), Some("hello"));
        assert!(d.tool_call.is_none());

        let d = LlmDecision::tool("search_slots", json!({"date_preference": "2026-09-01"}));
        let call = d.tool_call.unwrap();
        assert_eq!(call.name, "search_slots");
        assert_eq!(call.arguments["date_preference"], "2026-09-01");
    }
}
