//! Protocol-level event types: wire shape for one stream event (type + payload).
//! Envelope (session_id, event_id) is applied separately by [`crate::envelope`].

use serde::Serialize;
use serde_json::Value;

/// One element of an agent's output stream.
///
/// Every variant carries the originating agent's name and an RFC 3339
/// timestamp. `content` carries a text delta; `tool_call` carries the tool
/// name and its arguments object; `tool_result` carries the tool name and a
/// truncated string result; `error` carries a message.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    /// Session bookkeeping; always the first event of a stream.
    Session {
        agent: String,
        timestamp: String,
        session_id: String,
    },
    /// Emitted once per LLM round before any content/tool events for that round.
    Thinking { agent: String, timestamp: String },
    /// A text delta from the model.
    Content {
        agent: String,
        timestamp: String,
        delta: String,
    },
    /// A tool invocation the engine is about to make.
    ToolCall {
        agent: String,
        timestamp: String,
        tool_name: String,
        arguments: Value,
    },
    /// The result of a prior `tool_call`, always later in the same stream.
    ToolResult {
        agent: String,
        timestamp: String,
        tool_name: String,
        result: String,
    },
    /// Always the last event of a stream.
    Done { agent: String, timestamp: String },
    /// Emitted on an unrecoverable error, always followed by `done`.
    Error {
        agent: String,
        timestamp: String,
        message: String,
    },
}

impl ProtocolEvent {
    /// Serializes this event to a JSON object (type + payload only; no envelope).
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Truncates `result` to `max_len` bytes (on a char boundary), appending
    /// an ellipsis marker when truncated. Used by the native engine before
    /// constructing a `ToolResult` event, so a large tool result never blows
    /// up the event payload.
    pub fn truncate_result(result: &str, max_len: usize) -> String {
        if result.len() <= max_len {
            return result.to_string();
        }
        let mut end = max_len;
        while end > 0 && !result.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &result[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_result_passes_through_short_strings() {
        assert_eq!(ProtocolEvent::truncate_result("short", 100), "short");
    }

    #[test]
    fn truncate_result_truncates_long_strings() {
        let long = "a".repeat(200);
        let out = ProtocolEvent::truncate_result(&long, 50);
        assert!(out.starts_with(&"a".repeat(50)));
        assert!(out.ends_with("[truncated]"));
    }

    #[test]
    fn serializes_with_snake_case_tag() {
        let ev = ProtocolEvent::ToolCall {
            agent: "translator".to_string(),
            timestamp: "2026-07-28T00:00:00Z".to_string(),
            tool_name: "lookup".to_string(),
            arguments: serde_json::json!({"q": "hola"}),
        };
        let value = ev.to_value().unwrap();
        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["tool_name"], "lookup");
        assert_eq!(value["arguments"]["q"], "hola");
    }
}
