//! Message types for the engine's internal conversation history.
//!
//! A turn is stored as a `Vec<Message>`, not just the request/response pair,
//! because the native engine's tool loop must replay assistant and tool-role
//! messages verbatim on the next LLM call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One requested tool invocation as reported by the LLM, before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned id for this call; echoed back in the matching tool message.
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// A single message in the conversation history.
///
/// `Assistant` carries both the free-text content and any tool calls the
/// model requested in the same turn (both may be empty, though not both at
/// once in practice); `Tool` carries the result of one prior `ToolCallRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    System(String),
    User(String),
    Assistant {
        content: String,
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// The text content carried by this message, for roles that have one.
    pub fn text(&self) -> &str {
        match self {
            Self::System(s) | Self::User(s) => s,
            Self::Assistant { content, .. } => content,
            Self::Tool { content, .. } => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_produce_expected_variant() {
        assert!(matches!(Message::system("s"), Message::System(c) if c == "s"));
        assert!(matches!(Message::user("u"), Message::User(c) if c == "u"));
        let a = Message::assistant("a");
        assert!(matches!(&a, Message::Assistant { content, tool_calls } if content == "a" && tool_calls.is_empty()));
    }

    #[test]
    fn round_trips_through_serde() {
        let msgs = vec![
            Message::system("sys"),
            Message::user("usr"),
            Message::assistant_with_tool_calls(
                "thinking",
                vec![ToolCallRequest {
                    id: "c1".into(),
                    name: "lookup".into(),
                    arguments: serde_json::json!({"q": "x"}),
                }],
            ),
            Message::tool("c1", "lookup", "result text"),
        ];
        for m in msgs {
            let json = serde_json::to_string(&m).unwrap();
            let back: Message = serde_json::from_str(&json).unwrap();
            assert_eq!(m.text(), back.text());
        }
    }
}
