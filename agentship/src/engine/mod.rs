//! C7 — Engines: the heart of the core. `Engine` is the
//! trait both implementations share; `NativeEngine` drives the tool loop
//! itself, `OrchestratedEngine` delegates to a framework-provided runner,
//! and `MiddlewareEngine` wraps either with a before/after chain.

mod middleware;
mod native;
mod orchestrated;

pub use middleware::{Middleware, MiddlewareEngine};
pub use native::NativeEngine;
pub use orchestrated::{OrchestratedEngine, OrchestratedRunner, RunnerEvent};

use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;
use tokio_stream::Stream;

use crate::error::EngineError;
use stream_event::ProtocolEvent;

/// One turn's input: the user's message plus an optional declared output
/// shape for the non-streaming path.
#[derive(Debug, Clone)]
pub struct RunInput {
    pub message: String,
    pub output_schema: Option<OutputSchema>,
}

impl RunInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), output_schema: None }
    }

    pub fn with_output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

/// The declared shape of a non-streaming run's output: just
/// enough to apply the "exactly one field" fallback rule when the model's
/// content isn't valid JSON.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub fields: Vec<String>,
}

impl OutputSchema {
    pub fn new(fields: Vec<impl Into<String>>) -> Self {
        Self { fields: fields.into_iter().map(Into::into).collect() }
    }
}

/// Parses a non-streaming run's final content against `schema`: strip
/// Markdown code-fence wrappers, try JSON, and if that fails fall back to
/// the raw content — wrapped in `schema`'s single field if one was
/// declared, or returned as a plain string if no schema applies at all.
/// Only errors when a schema with more than one field can't be satisfied.
pub fn parse_output(content: &str, schema: Option<&OutputSchema>) -> Result<Value, EngineError> {
    let stripped = strip_code_fences(content);
    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        return Ok(value);
    }
    match schema {
        None => Ok(Value::String(stripped.to_string())),
        Some(schema) if schema.fields.len() == 1 => {
            let mut obj = serde_json::Map::new();
            obj.insert(schema.fields[0].clone(), Value::String(stripped.to_string()));
            Ok(Value::Object(obj))
        }
        Some(_) => Err(EngineError::OutputSchema(format!("content is not valid JSON and schema has != 1 field: {content}"))),
    }
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the opening fence line (e.g. ```json).
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest.trim())
}

/// What an engine declares about itself.
#[derive(Debug, Clone)]
pub struct EngineCapabilities {
    pub supported_providers: Vec<String>,
    pub supports_sse_streaming: bool,
    pub supports_tool_calling: bool,
    pub supports_bidi_streaming: bool,
    pub supports_multimodal: bool,
    pub notes: String,
}

pub type EventStream = Pin<Box<dyn Stream<Item = ProtocolEvent> + Send>>;

/// Both engines implement this contract.
#[async_trait]
pub trait Engine: Send + Sync {
    fn engine_name(&self) -> &str;
    fn capabilities(&self) -> EngineCapabilities;

    /// Rebuilds internal state after a config change. Most engines have
    /// nothing to rebuild; the default is a no-op success.
    async fn rebuild(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn run(&self, user_id: &str, session_id: &str, input: RunInput) -> Result<Value, EngineError>;
    async fn run_stream(&self, user_id: &str, session_id: &str, input: RunInput) -> EventStream;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_output_accepts_plain_json() {
        let value = parse_output(r#"{"translated_text":"Hola"}"#, None).unwrap();
        assert_eq!(value["translated_text"], "Hola");
    }

    #[test]
    fn parse_output_strips_markdown_fences() {
        let value = parse_output("```json\n{\"a\": 1}\n```", None).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn parse_output_falls_back_to_single_field_schema() {
        let schema = OutputSchema::new(vec!["translated_text"]);
        let value = parse_output("Hola", Some(&schema)).unwrap();
        assert_eq!(value["translated_text"], "Hola");
    }

    #[test]
    fn parse_output_errors_when_not_json_and_schema_has_multiple_fields() {
        let schema = OutputSchema::new(vec!["a", "b"]);
        assert!(parse_output("not json", Some(&schema)).is_err());
    }

    #[test]
    fn parse_output_falls_back_to_raw_string_when_no_schema() {
        let value = parse_output("not json", None).unwrap();
        assert_eq!(value, Value::String("not json".to_string()));
    }
}
