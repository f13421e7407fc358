//! Scripted `LlmClient` for tests: a queue of pre-baked rounds, popped one
//! per call, with a convenience builder for the common "one tool call, then
//! the final answer" shape.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{FinishReason, LlmClient, LlmError, LlmRequest, LlmTurnResult, ParsedToolCall, StreamDelta};

/// One scripted LLM round.
#[derive(Debug, Clone)]
pub struct ScriptedRound {
    pub content: String,
    pub tool_calls: Vec<ParsedToolCall>,
    pub finish_reason: FinishReason,
}

impl ScriptedRound {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
        }
    }

    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            content: String::new(),
            tool_calls: vec![ParsedToolCall {
                id: id.into(),
                name: name.into(),
                arguments,
            }],
            finish_reason: FinishReason::ToolCalls,
        }
    }
}

/// Scripted LLM client: each `invoke`/`invoke_stream` call pops the next
/// entry from the queue. Panics (via `expect`) if the tool loop calls it
/// more times than the test scripted — that mismatch is a test bug, not a
/// runtime condition to handle gracefully.
pub struct MockLlm {
    script: Mutex<VecDeque<Result<ScriptedRound, LlmError>>>,
}

impl MockLlm {
    pub fn new(rounds: Vec<Result<ScriptedRound, LlmError>>) -> Self {
        Self {
            script: Mutex::new(rounds.into_iter().collect()),
        }
    }

    /// A tool-call round followed by a final-answer round: used both for a
    /// plain function tool loop and for a sub-agent delegation.
    pub fn first_tool_then_answer(
        tool_name: impl Into<String>,
        arguments: serde_json::Value,
        final_answer: impl Into<String>,
    ) -> Self {
        Self::new(vec![
            Ok(ScriptedRound::tool_call("call-1", tool_name, arguments)),
            Ok(ScriptedRound::content(final_answer)),
        ])
    }

    /// Rate-limited once, then succeeds.
    pub fn rate_limited_once_then(round: ScriptedRound) -> Self {
        Self::new(vec![Err(LlmError::RateLimited), Ok(round)])
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke_stream(
        &self,
        _request: &LlmRequest,
        delta_tx: Option<mpsc::Sender<StreamDelta>>,
    ) -> Result<LlmTurnResult, LlmError> {
        let next = self
            .script
            .lock()
            .expect("mock llm lock poisoned")
            .pop_front()
            .expect("MockLlm called more times than scripted");
        let round = next?;

        if let Some(tx) = &delta_tx {
            if !round.content.is_empty() {
                let _ = tx.send(StreamDelta::Content(round.content.clone())).await;
            }
            for (i, call) in round.tool_calls.iter().enumerate() {
                let _ = tx
                    .send(StreamDelta::ToolCallDelta {
                        index: i,
                        id: Some(call.id.clone()),
                        name: Some(call.name.clone()),
                        arguments_delta: call.arguments.to_string(),
                    })
                    .await;
            }
        }

        Ok(LlmTurnResult {
            content: round.content,
            tool_calls: round.tool_calls,
            finish_reason: round.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn request() -> LlmRequest {
        LlmRequest {
            provider: "mock".into(),
            model: "mock-model".into(),
            temperature: 0.2,
            messages: vec![Message::user("hi")],
            tools: vec![],
            prefer_json: false,
        }
    }

    #[tokio::test]
    async fn pops_rounds_in_order() {
        let llm = MockLlm::first_tool_then_answer("list_tables", serde_json::json!({}), "Tables: users");
        let first = llm.invoke(&request()).await.unwrap();
        assert_eq!(first.finish_reason, FinishReason::ToolCalls);
        let second = llm.invoke(&request()).await.unwrap();
        assert_eq!(second.content, "Tables: users");
    }

    #[tokio::test]
    async fn rate_limited_once_then_succeeds() {
        let llm = MockLlm::rate_limited_once_then(ScriptedRound::content("ok"));
        assert!(matches!(llm.invoke(&request()).await, Err(LlmError::RateLimited)));
        let second = llm.invoke(&request()).await.unwrap();
        assert_eq!(second.content, "ok");
    }

    #[tokio::test]
    #[should_panic(expected = "called more times than scripted")]
    async fn panics_when_called_past_the_script() {
        let llm = MockLlm::new(vec![Ok(ScriptedRound::content("only one"))]);
        llm.invoke(&request()).await.unwrap();
        let _ = llm.invoke(&request()).await;
    }
}
