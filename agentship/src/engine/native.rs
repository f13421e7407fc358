//! The native engine: drives the tool loop itself.
//! Expressed as three private async steps (think, act, observe) over an
//! explicit `ToolCallContext` + message buffer, not a compiled state graph —
//! a general, checkpointable-per-node state machine would solve a more
//! general problem this single linear loop doesn't need (see DESIGN.md).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::llm::{LlmClient, LlmError, LlmRequest, LlmTurnResult, StreamDelta};
use crate::message::Message;
use crate::observability::{AgentDecision, Observer};
use crate::session::NativeSessionStore;
use crate::tools::{Tool, ToolCallContext};
use stream_event::ProtocolEvent;

use super::{parse_output, Engine, EngineCapabilities, EventStream, RunInput};

/// Linear back-off schedule for LLM rate-limit retries: up to 4 attempts
/// at 10s, 20s, 30s, 40s.
const RATE_LIMIT_BACKOFF_SECS: [u64; 4] = [10, 20, 30, 40];

/// Patterns an LLM echoes back from a tool's schema instead of a real id.
const PLACEHOLDER_PATTERNS: &[&str] = &["user_id", "<user_id>", "the exact user id from input"];

#[derive(Clone)]
pub struct NativeEngine {
    name: String,
    provider: String,
    model: String,
    temperature: f32,
    system_instruction: String,
    max_tool_rounds: u32,
    tools: Vec<Arc<dyn Tool>>,
    llm: Arc<dyn LlmClient>,
    session_store: Arc<NativeSessionStore>,
    observer: Arc<dyn Observer>,
}

impl NativeEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        system_instruction: impl Into<String>,
        max_tool_rounds: u32,
        tools: Vec<Arc<dyn Tool>>,
        llm: Arc<dyn LlmClient>,
        session_store: Arc<NativeSessionStore>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            model: model.into(),
            temperature,
            system_instruction: system_instruction.into(),
            max_tool_rounds,
            tools,
            llm,
            session_store,
            observer,
        }
    }

    fn build_request(&self, messages: &[Message]) -> LlmRequest {
        LlmRequest {
            provider: self.provider.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            messages: messages.to_vec(),
            tools: self.tools.iter().map(|t| t.spec().clone()).collect(),
            prefer_json: true,
        }
    }

    /// Placeholder-argument injection:
    /// a `user_id` value that isn't a real UUID v4 and matches a known
    /// placeholder pattern is rewritten to the request context's user id.
    fn apply_placeholder_rule(&self, mut arguments: Value, ctx: &ToolCallContext) -> Value {
        if let Some(obj) = arguments.as_object_mut() {
            if let Some(Value::String(raw)) = obj.get("user_id").cloned() {
                if is_placeholder_user_id(&raw) {
                    obj.insert("user_id".to_string(), Value::String(ctx.user_id.clone()));
                }
            }
        }
        arguments
    }

    /// Calls the LLM, forwarding content deltas to `event_tx` as they arrive,
    /// retrying on rate-limit errors.
    async fn invoke_llm(
        &self,
        request: LlmRequest,
        event_tx: Option<&mpsc::Sender<ProtocolEvent>>,
    ) -> Result<LlmTurnResult, EngineError> {
        let mut attempt = 0usize;
        loop {
            let (delta_tx, mut delta_rx) = mpsc::channel(64);
            let llm = self.llm.clone();
            let request_clone = request.clone();
            let join = tokio::spawn(async move { llm.invoke_stream(&request_clone, Some(delta_tx)).await });

            while let Some(delta) = delta_rx.recv().await {
                if let StreamDelta::Content(text) = delta {
                    emit(event_tx, ProtocolEvent::Content { agent: self.name.clone(), timestamp: rfc3339_now(), delta: text }).await;
                }
            }

            let outcome = join.await.map_err(|e| EngineError::Llm(e.to_string()))?;
            match outcome {
                Ok(result) => return Ok(result),
                Err(LlmError::RateLimited) => {
                    if attempt >= RATE_LIMIT_BACKOFF_SECS.len() {
                        return Err(EngineError::RateLimited);
                    }
                    tokio::time::sleep(std::time::Duration::from_secs(RATE_LIMIT_BACKOFF_SECS[attempt])).await;
                    attempt += 1;
                }
                Err(LlmError::Provider(msg)) => return Err(EngineError::Llm(msg)),
            }
        }
    }

    /// Runs the tool loop to completion: returns the final assistant content,
    /// or signals round exhaustion so the caller can
    /// skip output-schema parsing for the sentinel message. `event_tx` is
    /// `None` for the non-streaming path and `Some` for `run_stream`.
    async fn run_tool_loop(
        &self,
        ctx: &ToolCallContext,
        messages: &mut Vec<Message>,
        event_tx: Option<&mpsc::Sender<ProtocolEvent>>,
    ) -> Result<LoopOutcome, EngineError> {
        for _round in 0..self.max_tool_rounds {
            self.observer.before_model(&self.name).await;
            emit(event_tx, ProtocolEvent::Thinking { agent: self.name.clone(), timestamp: rfc3339_now() }).await;

            let request = self.build_request(messages);
            let result = self.invoke_llm(request, event_tx).await?;

            let decision = if result.tool_calls.is_empty() {
                AgentDecision::FinalResponse
            } else {
                AgentDecision::CallTools(result.tool_calls.iter().map(|c| c.name.clone()).collect())
            };
            self.observer.after_model(&self.name, &decision).await;

            if result.tool_calls.is_empty() {
                return Ok(LoopOutcome::Final(result.content));
            }

            messages.push(Message::assistant_with_tool_calls(
                result.content.clone(),
                result
                    .tool_calls
                    .iter()
                    .map(|c| crate::message::ToolCallRequest { id: c.id.clone(), name: c.name.clone(), arguments: c.arguments.clone() })
                    .collect(),
            ));

            for call in &result.tool_calls {
                let arguments = self.apply_placeholder_rule(call.arguments.clone(), ctx);
                emit(
                    event_tx,
                    ProtocolEvent::ToolCall { agent: self.name.clone(), timestamp: rfc3339_now(), tool_name: call.name.clone(), arguments: arguments.clone() },
                )
                .await;

                let tool = self.tools.iter().find(|t| t.spec().name == call.name);
                self.observer
                    .before_tool(&self.name, &call.name, &arguments, &ctx.session_id, tool.map(|t| t.spec().is_agent_tool).unwrap_or(false))
                    .await;

                let result_str = match tool {
                    Some(tool) => match tool.call(arguments, ctx).await {
                        Ok(value) => value_to_tool_result_string(value),
                        Err(e) => format!("Error executing tool {}: {e}", call.name),
                    },
                    None => format!("Error executing tool {}: tool not registered", call.name),
                };

                self.observer.after_tool(&self.name, &call.name, &Ok(Value::String(result_str.clone()))).await;

                emit(
                    event_tx,
                    ProtocolEvent::ToolResult {
                        agent: self.name.clone(),
                        timestamp: rfc3339_now(),
                        tool_name: call.name.clone(),
                        result: ProtocolEvent::truncate_result(&result_str, 2000),
                    },
                )
                .await;

                messages.push(Message::tool(call.id.clone(), call.name.clone(), result_str));
            }
        }

        tracing::warn!(agent = %self.name, max_tool_rounds = self.max_tool_rounds, "max tool rounds reached");
        Ok(LoopOutcome::Exhausted)
    }
}

/// What `run_tool_loop` produced: a genuine final
/// answer, subject to the output-schema parsing rule, or round exhaustion,
/// whose sentinel message is returned verbatim without parsing.
enum LoopOutcome {
    Final(String),
    Exhausted,
}

impl LoopOutcome {
    const EXHAUSTED_MESSAGE: &'static str = "Max tool iterations reached. Please try again.";

    fn into_content(self) -> String {
        match self {
            Self::Final(content) => content,
            Self::Exhausted => Self::EXHAUSTED_MESSAGE.to_string(),
        }
    }
}

#[async_trait]
impl Engine for NativeEngine {
    fn engine_name(&self) -> &str {
        "native"
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            supported_providers: vec![self.provider.clone()],
            supports_sse_streaming: true,
            supports_tool_calling: true,
            supports_bidi_streaming: false,
            supports_multimodal: false,
            notes: "native tool-loop engine".to_string(),
        }
    }

    async fn run(&self, user_id: &str, session_id: &str, input: RunInput) -> Result<Value, EngineError> {
        self.session_store.ensure_session(user_id, session_id).await?;
        self.observer.before_agent(&self.name, session_id).await;

        let mut messages = self.session_store.load(user_id, session_id).await?;
        if messages.is_empty() {
            messages.push(Message::system(self.system_instruction.clone()));
        }
        messages.push(Message::user(input.message.clone()));

        let ctx = ToolCallContext { user_id: user_id.to_string(), session_id: session_id.to_string() };
        let outcome = self.run_tool_loop(&ctx, &mut messages, None).await?;
        let exhausted = matches!(outcome, LoopOutcome::Exhausted);
        let content = outcome.into_content();
        messages.push(Message::assistant(content.clone()));
        self.session_store.save(user_id, session_id, messages).await?;

        self.observer.after_agent(&self.name, session_id).await;
        if exhausted {
            // The sentinel is returned verbatim, not
            // run through the JSON/schema parsing rule that applies to a
            // genuine model answer.
            return Ok(Value::String(content));
        }
        parse_output(&content, input.output_schema.as_ref())
    }

    async fn run_stream(&self, user_id: &str, session_id: &str, input: RunInput) -> EventStream {
        let (tx, rx) = mpsc::channel(64);
        let user_id = user_id.to_string();
        let session_id = session_id.to_string();

        // Every field is cheap to clone (Strings, an f32/u32, and Arcs), so
        // the background task gets its own owned `NativeEngine` rather than
        // needing a `self: Arc<Self>` receiver on the trait method: the
        // producer runs as an owned task that writes to the channel.
        let engine = self.clone();
        tokio::spawn(async move {
            engine.drive_stream(user_id, session_id, input, tx).await;
        });

        Box::pin(tokio_stream::wrappers::ReceiverStream::new(rx))
    }
}

impl NativeEngine {
    async fn drive_stream(&self, user_id: String, session_id: String, input: RunInput, tx: mpsc::Sender<ProtocolEvent>) {
        if let Err(e) = self.session_store.ensure_session(&user_id, &session_id).await {
            let _ = tx.send(ProtocolEvent::Error { agent: self.name.clone(), timestamp: rfc3339_now(), message: e.to_string() }).await;
            let _ = tx.send(ProtocolEvent::Done { agent: self.name.clone(), timestamp: rfc3339_now() }).await;
            return;
        }
        self.observer.before_agent(&self.name, &session_id).await;

        let mut messages = match self.session_store.load(&user_id, &session_id).await {
            Ok(m) => m,
            Err(e) => {
                let _ = tx.send(ProtocolEvent::Error { agent: self.name.clone(), timestamp: rfc3339_now(), message: e.to_string() }).await;
                let _ = tx.send(ProtocolEvent::Done { agent: self.name.clone(), timestamp: rfc3339_now() }).await;
                return;
            }
        };
        if messages.is_empty() {
            messages.push(Message::system(self.system_instruction.clone()));
        }
        messages.push(Message::user(input.message.clone()));

        let ctx = ToolCallContext { user_id: user_id.clone(), session_id: session_id.clone() };
        // `run_tool_loop` emits thinking/content/tool_call/tool_result
        // itself; on error it has already returned, nothing more to emit
        // besides the terminal error/done pair.
        match self.run_tool_loop(&ctx, &mut messages, Some(&tx)).await {
            Ok(outcome) => {
                messages.push(Message::assistant(outcome.into_content()));
                if let Err(e) = self.session_store.save(&user_id, &session_id, messages).await {
                    let _ = tx.send(ProtocolEvent::Error { agent: self.name.clone(), timestamp: rfc3339_now(), message: e.to_string() }).await;
                }
            }
            Err(e) => {
                let _ = tx.send(ProtocolEvent::Error { agent: self.name.clone(), timestamp: rfc3339_now(), message: e.to_string() }).await;
            }
        }

        self.observer.after_agent(&self.name, &session_id).await;
        let _ = tx.send(ProtocolEvent::Done { agent: self.name.clone(), timestamp: rfc3339_now() }).await;
    }
}

async fn emit(event_tx: Option<&mpsc::Sender<ProtocolEvent>>, event: ProtocolEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.send(event).await;
    }
}

fn value_to_tool_result_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// A value "looks like" a real user id if it parses as a UUID v4; anything
/// else that matches one of the known placeholder patterns gets rewritten.
fn is_placeholder_user_id(raw: &str) -> bool {
    if uuid::Uuid::parse_str(raw).is_ok() {
        return false;
    }
    let lower = raw.to_lowercase();
    PLACEHOLDER_PATTERNS.iter().any(|p| lower.contains(p))
}

pub(crate) fn rfc3339_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::memory::MemorySaver;
    use crate::observability::NoopObserver;
    use tokio_stream::StreamExt;

    fn engine(llm: Arc<dyn LlmClient>, tools: Vec<Arc<dyn Tool>>) -> NativeEngine {
        NativeEngine::new(
            "translator",
            "mock",
            "mock-model",
            0.2,
            "Translate the given text.",
            10,
            tools,
            llm,
            Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new()))),
            Arc::new(NoopObserver),
        )
    }

    #[test]
    fn placeholder_user_id_detection() {
        assert!(is_placeholder_user_id("user_id"));
        assert!(is_placeholder_user_id("<user_id>"));
        assert!(is_placeholder_user_id("the exact user id from input"));
        assert!(!is_placeholder_user_id("3f8c1e2a-4b5d-4c6e-9f0a-1b2c3d4e5f6a"));
        assert!(!is_placeholder_user_id("some-other-opaque-string"));
    }

    #[tokio::test]
    async fn translation_no_tools_run_returns_parsed_output() {
        let llm = Arc::new(MockLlm::new(vec![Ok(crate::llm::mock::ScriptedRound::content(r#"{"translated_text":"Hola"}"#))]));
        let engine = engine(llm, vec![]);
        let output = engine
            .run("u1", "s1", RunInput::new("Hello").with_output_schema(super::super::OutputSchema::new(vec!["translated_text"])))
            .await
            .unwrap();
        assert_eq!(output["translated_text"], "Hola");
    }

    #[tokio::test]
    async fn translation_run_stream_ends_with_done() {
        let llm = Arc::new(MockLlm::new(vec![Ok(crate::llm::mock::ScriptedRound::content(r#"{"translated_text":"Hola"}"#))]));
        let engine = engine(llm, vec![]);
        let mut stream = engine.run_stream("u1", "s1", RunInput::new("Hello")).await;
        let mut events = Vec::new();
        while let Some(ev) = stream.next().await {
            events.push(ev);
        }
        assert!(matches!(events.last(), Some(ProtocolEvent::Done { .. })));
        assert!(matches!(events.first(), Some(ProtocolEvent::Thinking { .. })));
    }

    // Placeholder injection rewrites user_id before both the tool_call
    // event and invocation.
    #[tokio::test]
    async fn placeholder_user_id_is_rewritten_before_tool_call_and_invocation() {
        use crate::tools::{Tool, ToolCallContext, ToolParameter, ToolSpec};
        use crate::error::ToolSourceError;

        struct GetUserTool {
            spec: ToolSpec,
            seen: std::sync::Mutex<Vec<Value>>,
        }
        #[async_trait]
        impl Tool for GetUserTool {
            fn spec(&self) -> &ToolSpec {
                &self.spec
            }
            async fn call(&self, arguments: Value, _ctx: &ToolCallContext) -> Result<Value, ToolSourceError> {
                self.seen.lock().unwrap().push(arguments.clone());
                Ok(Value::String("ok".into()))
            }
        }

        let tool = Arc::new(GetUserTool {
            spec: ToolSpec {
                name: "get_user".into(),
                description: "Looks up a user".into(),
                input_schema: serde_json::json!({"type":"object"}),
                parameters: vec![ToolParameter { name: "user_id".into(), type_name: "string".into(), required: true, description: None }],
                is_agent_tool: false,
            },
            seen: std::sync::Mutex::new(Vec::new()),
        });

        let llm = Arc::new(MockLlm::first_tool_then_answer(
            "get_user",
            serde_json::json!({"user_id": "the exact user id from input"}),
            "done",
        ));
        let engine = engine(llm, vec![tool.clone() as Arc<dyn Tool>]);

        let mut stream = engine.run_stream("3f8c1e2a-4b5d-4c6e-9f0a-1b2c3d4e5f6a", "s1", RunInput::new("who am i")).await;
        let mut saw_tool_call_with_real_id = false;
        while let Some(ev) = stream.next().await {
            if let ProtocolEvent::ToolCall { arguments, .. } = ev {
                if arguments["user_id"] == "3f8c1e2a-4b5d-4c6e-9f0a-1b2c3d4e5f6a" {
                    saw_tool_call_with_real_id = true;
                }
            }
        }
        assert!(saw_tool_call_with_real_id);
        let seen = tool.seen.lock().unwrap();
        assert_eq!(seen[0]["user_id"], "3f8c1e2a-4b5d-4c6e-9f0a-1b2c3d4e5f6a");
    }

    // The loop terminates within max_tool_rounds regardless of LLM
    // behavior (here: it always calls a tool, never finishing on its own).
    #[tokio::test]
    async fn loop_terminates_within_max_rounds_even_if_llm_always_calls_tools() {
        use crate::tools::{Tool, ToolCallContext, ToolParameter, ToolSpec};
        use crate::error::ToolSourceError;

        struct AlwaysToolLlm;
        #[async_trait]
        impl LlmClient for AlwaysToolLlm {
            async fn invoke_stream(&self, _request: &LlmRequest, _delta_tx: Option<mpsc::Sender<StreamDelta>>) -> Result<LlmTurnResult, LlmError> {
                Ok(LlmTurnResult {
                    content: String::new(),
                    tool_calls: vec![crate::llm::ParsedToolCall { id: "c1".into(), name: "noop".into(), arguments: serde_json::json!({}) }],
                    finish_reason: crate::llm::FinishReason::ToolCalls,
                })
            }
        }

        struct NoopTool {
            spec: ToolSpec,
        }
        #[async_trait]
        impl Tool for NoopTool {
            fn spec(&self) -> &ToolSpec {
                &self.spec
            }
            async fn call(&self, _arguments: Value, _ctx: &ToolCallContext) -> Result<Value, ToolSourceError> {
                Ok(Value::String("noop".into()))
            }
        }

        let tool = Arc::new(NoopTool {
            spec: ToolSpec {
                name: "noop".into(),
                description: "does nothing".into(),
                input_schema: serde_json::json!({"type":"object"}),
                parameters: vec![ToolParameter { name: "x".into(), type_name: "string".into(), required: false, description: None }],
                is_agent_tool: false,
            },
        });

        let mut eng = engine(Arc::new(AlwaysToolLlm), vec![tool as Arc<dyn Tool>]);
        eng.max_tool_rounds = 2;
        let output = eng.run("u1", "s1", RunInput::new("go forever")).await.unwrap();
        assert_eq!(output, Value::String("Max tool iterations reached. Please try again.".into()));
    }
}
