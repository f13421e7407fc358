//! LLM client abstraction driving the native engine's tool loop: an
//! `invoke`/`invoke_stream` split where the non-streaming path is the
//! default, built in terms of draining the stream, reshaped around what the
//! tool loop actually needs — a per-round call that carries the tool schema
//! and returns both accumulated text and parsed tool calls, with streaming
//! deltas pushed through a channel.

mod mock;
mod openai;

pub use mock::{MockLlm, ScriptedRound};
pub use openai::OpenAiLlm;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::message::Message;
use crate::tools::ToolSpec;

/// One request for a single LLM round (step 2: "the message
/// list, the tool schemas, and a response-format hint").
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    /// Request structured JSON output, for providers that support it.
    pub prefer_json: bool,
}

/// One piece of a streaming round, pushed through the delta channel as the
/// provider emits it.
#[derive(Debug, Clone)]
pub enum StreamDelta {
    Content(String),
    ToolCallDelta {
        index: usize,
        id: Option<String>,
        name: Option<String>,
        arguments_delta: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    Other,
}

/// One fully assembled tool call, parsed from accumulated argument deltas
/// (step 3: "parse its arguments as JSON (empty object on
/// parse failure)").
#[derive(Debug, Clone)]
pub struct ParsedToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// The complete result of one LLM round.
#[derive(Debug, Clone)]
pub struct LlmTurnResult {
    pub content: String,
    pub tool_calls: Vec<ParsedToolCall>,
    pub finish_reason: FinishReason,
}

/// Errors from an LLM call, classified by recoverability:
/// `RateLimited` is the only variant the engine retries on.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("rate limited (429)")]
    RateLimited,
    #[error("provider error: {0}")]
    Provider(String),
}

/// Parses arguments accumulated as a JSON string, per 's
/// "empty object on parse failure" rule.
pub fn parse_tool_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({}))
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Non-streaming call: the same round, but without
    /// per-token content events.
    async fn invoke(&self, request: &LlmRequest) -> Result<LlmTurnResult, LlmError> {
        self.invoke_stream(request, None).await
    }

    /// Streaming call. When `delta_tx` is `Some`, implementations push every
    /// `StreamDelta` as it arrives; the full `LlmTurnResult` is still
    /// returned once the round finishes.
    async fn invoke_stream(
        &self,
        request: &LlmRequest,
        delta_tx: Option<mpsc::Sender<StreamDelta>>,
    ) -> Result<LlmTurnResult, LlmError>;
}
