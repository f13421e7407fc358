//! Orchestrated engine: a thinner wrapper that delegates
//! the tool loop to a framework-provided runner and normalizes its event
//! stream into the same `ProtocolEvent` shape the native engine produces.
//! Grounded on `session/orchestrated.rs`'s `FrameworkSessionService`
//! pattern for representing an out-of-scope external collaborator as a
//! narrow trait the core only consumes.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};

use crate::error::EngineError;
use crate::session::OrchestratedSessionStore;
use stream_event::ProtocolEvent;

use super::native::rfc3339_now;
use super::{parse_output, Engine, EngineCapabilities, EventStream, RunInput};

/// One event the framework-provided runner emits, before normalization into
/// a `ProtocolEvent`: a function-call part becomes `tool_call`, a
/// function-response part becomes `tool_result`, a text part becomes `content`.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    FunctionCall { name: String, arguments: Value },
    FunctionResponse { name: String, result: String },
    Text(String),
}

pub type RunnerEventStream = Pin<Box<dyn Stream<Item = RunnerEvent> + Send>>;

/// The external framework's agent runner: an out-of-scope collaborator this
/// trait gives the core a narrow interface onto.
#[async_trait]
pub trait OrchestratedRunner: Send + Sync {
    async fn run_stream(&self, user_id: &str, session_id: &str, message: &str) -> Result<RunnerEventStream, EngineError>;
}

#[derive(Clone)]
pub struct OrchestratedEngine {
    name: String,
    provider: String,
    runner: Arc<dyn OrchestratedRunner>,
    session_store: Arc<OrchestratedSessionStore>,
}

impl OrchestratedEngine {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        runner: Arc<dyn OrchestratedRunner>,
        session_store: Arc<OrchestratedSessionStore>,
    ) -> Self {
        Self { name: name.into(), provider: provider.into(), runner, session_store }
    }

    fn to_protocol_event(&self, event: RunnerEvent) -> ProtocolEvent {
        match event {
            RunnerEvent::FunctionCall { name, arguments } => {
                ProtocolEvent::ToolCall { agent: self.name.clone(), timestamp: rfc3339_now(), tool_name: name, arguments }
            }
            RunnerEvent::FunctionResponse { name, result } => ProtocolEvent::ToolResult {
                agent: self.name.clone(),
                timestamp: rfc3339_now(),
                tool_name: name,
                result: ProtocolEvent::truncate_result(&result, 2000),
            },
            RunnerEvent::Text(text) => ProtocolEvent::Content { agent: self.name.clone(), timestamp: rfc3339_now(), delta: text },
        }
    }

    async fn drive_stream(&self, user_id: String, session_id: String, input: RunInput, tx: mpsc::Sender<ProtocolEvent>) {
        if let Err(e) = self.session_store.ensure_session(&user_id, &session_id).await {
            let _ = tx.send(ProtocolEvent::Error { agent: self.name.clone(), timestamp: rfc3339_now(), message: e.to_string() }).await;
            let _ = tx.send(ProtocolEvent::Done { agent: self.name.clone(), timestamp: rfc3339_now() }).await;
            return;
        }

        if tx.send(ProtocolEvent::Thinking { agent: self.name.clone(), timestamp: rfc3339_now() }).await.is_err() {
            return;
        }

        match self.runner.run_stream(&user_id, &session_id, &input.message).await {
            Ok(mut events) => {
                while let Some(event) = events.next().await {
                    // A send error means the consumer disconnected; the HTTP
                    // boundary already detected the cancellation, so this
                    // just stops pulling the runner's stream and exits
                    // without emitting further events.
                    if tx.send(self.to_protocol_event(event)).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(ProtocolEvent::Error { agent: self.name.clone(), timestamp: rfc3339_now(), message: e.to_string() }).await;
            }
        }

        let _ = tx.send(ProtocolEvent::Done { agent: self.name.clone(), timestamp: rfc3339_now() }).await;
    }
}

#[async_trait]
impl Engine for OrchestratedEngine {
    fn engine_name(&self) -> &str {
        "orchestrated"
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            supported_providers: vec![self.provider.clone()],
            supports_sse_streaming: true,
            supports_tool_calling: true,
            supports_bidi_streaming: false,
            // The underlying framework actually supports multimodal input;
            // this stays false until the core exercises that path itself.
            supports_multimodal: false,
            notes: "delegates the tool loop to a framework-provided runner".to_string(),
        }
    }

    async fn run(&self, user_id: &str, session_id: &str, input: RunInput) -> Result<Value, EngineError> {
        self.session_store.ensure_session(user_id, session_id).await?;
        let mut events = self.runner.run_stream(user_id, session_id, &input.message).await?;
        let mut content = String::new();
        while let Some(event) = events.next().await {
            if let RunnerEvent::Text(text) = event {
                content.push_str(&text);
            }
        }
        parse_output(&content, input.output_schema.as_ref())
    }

    async fn run_stream(&self, user_id: &str, session_id: &str, input: RunInput) -> EventStream {
        let (tx, rx) = mpsc::channel(64);
        let engine = self.clone();
        let user_id = user_id.to_string();
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            engine.drive_stream(user_id, session_id, input, tx).await;
        });
        Box::pin(tokio_stream::wrappers::ReceiverStream::new(rx))
    }
}
