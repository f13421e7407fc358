//! Agent facade: the `chat`/`chat_stream` boundary an agent presents to
//! whatever addresses it by name — the facade loads or returns a cached
//! agent instance and invokes `engine.run` or `engine.run_stream` on its
//! behalf.
//!
//! This crate does not implement agent *discovery* or *caching* — that is
//! "Agent facade + router glue" wiring an external application root
//! performs once at startup, ahead of the HTTP/SSE transport — only the
//! boundary contract: turning an [`AgentChatRequest`] into a call against an
//! already-built [`Engine`], and folding a turn-level failure into
//! [`AgentChatResponse`] rather than propagating it.

use std::sync::Arc;

use serde_json::Value;

use crate::engine::{Engine, EventStream, RunInput};
use crate::error::AgentError;
use stream_event::ProtocolEvent;

/// Request at the agent boundary. `query` is
/// a string or an object; [`AgentChatRequest::text`] is the common case.
#[derive(Debug, Clone)]
pub struct AgentChatRequest {
    pub agent_name: String,
    pub user_id: String,
    pub session_id: String,
    pub sender: String,
    pub query: Value,
    pub features: Vec<(String, Value)>,
    pub artifacts: Vec<String>,
}

impl AgentChatRequest {
    pub fn text(
        agent_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            sender: "user".into(),
            query: Value::String(text.into()),
            features: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// The text the engine's `RunInput` wants: the query verbatim if it's
    /// already a string, or its JSON encoding otherwise. The engine's view
    /// is just a structured input value conforming to the agent's declared
    /// input schema.
    fn message_text(&self) -> String {
        match &self.query {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Response at the agent boundary.
#[derive(Debug, Clone)]
pub struct AgentChatResponse {
    pub agent_name: String,
    pub user_id: String,
    pub session_id: String,
    pub success: bool,
    pub response: Value,
    pub error: Option<String>,
}

impl AgentChatResponse {
    fn ok(request: &AgentChatRequest, response: Value) -> Self {
        Self {
            agent_name: request.agent_name.clone(),
            user_id: request.user_id.clone(),
            session_id: request.session_id.clone(),
            success: true,
            response,
            error: None,
        }
    }

    fn failed(request: &AgentChatRequest, message: String) -> Self {
        Self {
            agent_name: request.agent_name.clone(),
            user_id: request.user_id.clone(),
            session_id: request.session_id.clone(),
            success: false,
            response: Value::Null,
            error: Some(message),
        }
    }

    /// The final text a caller (a test, `AgentTool`) usually wants: the
    /// response value as-is if it's a string, its JSON encoding otherwise,
    /// or the error message on failure.
    pub fn content(&self) -> String {
        if self.success {
            match &self.response {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }
        } else {
            self.error.clone().unwrap_or_default()
        }
    }
}

/// A fully wired agent: a name plus the [`Engine`] that executes its turns.
/// Construction (loading the config, building the tool set, picking a
/// session store) happens once per agent at startup, outside this crate;
/// `Agent` itself only adapts the chat boundary onto `Engine::run`/
/// `run_stream`.
pub struct Agent {
    name: String,
    engine: Arc<dyn Engine>,
}

impl Agent {
    pub fn new(name: impl Into<String>, engine: Arc<dyn Engine>) -> Self {
        Self { name: name.into(), engine }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-streaming turn. A request addressed to the wrong
    /// agent name is the one hard error this method returns; any failure
    /// from the engine itself is folded into `success=false` instead.
    pub async fn chat(&self, request: AgentChatRequest) -> Result<AgentChatResponse, AgentError> {
        if request.agent_name != self.name {
            return Err(AgentError::UnknownAgent(request.agent_name));
        }
        let input = RunInput::new(request.message_text());
        match self.engine.run(&request.user_id, &request.session_id, input).await {
            Ok(value) => Ok(AgentChatResponse::ok(&request, value)),
            Err(e) => Ok(AgentChatResponse::failed(&request, e.to_string())),
        }
    }

    /// Streaming turn. The façade owns the leading `session` event (id
    /// bookkeeping), then hands off to the engine's own stream, which
    /// opens with a `thinking` event; everything after that comes straight
    /// from the engine.
    pub async fn chat_stream(&self, request: AgentChatRequest) -> EventStream {
        let session_event = ProtocolEvent::Session {
            agent: self.name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            session_id: request.session_id.clone(),
        };
        let input = RunInput::new(request.message_text());
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let engine = self.engine.clone();
        let user_id = request.user_id.clone();
        let session_id = request.session_id.clone();
        tokio::spawn(async move {
            if tx.send(session_event).await.is_err() {
                return;
            }
            let mut inner = engine.run_stream(&user_id, &session_id, input).await;
            use tokio_stream::StreamExt;
            while let Some(event) = inner.next().await {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        Box::pin(tokio_stream::wrappers::ReceiverStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLlm, ScriptedRound};
    use crate::{MemorySaver, NativeEngine, NativeSessionStore, NoopObserver};
    use tokio_stream::StreamExt;

    fn engine(rounds: Vec<Result<ScriptedRound, crate::llm::LlmError>>) -> Arc<dyn Engine> {
        let llm = Arc::new(MockLlm::new(rounds));
        let session_store = Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new())));
        Arc::new(NativeEngine::new(
            "translator",
            "mock",
            "mock-model",
            0.2,
            "Translate.",
            10,
            vec![],
            llm,
            session_store,
            Arc::new(NoopObserver),
        ))
    }

    #[tokio::test]
    async fn chat_rejects_mismatched_agent_name() {
        let agent = Agent::new("translator", engine(vec![]));
        let request = AgentChatRequest::text("someone-else", "u1", "s1", "hi");
        let err = agent.chat(request).await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownAgent(name) if name == "someone-else"));
    }

    #[tokio::test]
    async fn chat_returns_success_response_on_clean_run() {
        let agent = Agent::new("translator", engine(vec![Ok(ScriptedRound::content("Hola"))]));
        let request = AgentChatRequest::text("translator", "u1", "s1", "Hello");
        let response = agent.chat(request).await.unwrap();
        assert!(response.success);
        assert_eq!(response.content(), "Hola");
    }

    #[tokio::test]
    async fn chat_stream_begins_with_session_and_ends_with_done() {
        let agent = Agent::new("translator", engine(vec![Ok(ScriptedRound::content("Hola"))]));
        let request = AgentChatRequest::text("translator", "u1", "s1", "Hello");
        let mut stream = agent.chat_stream(request).await;

        let first = stream.next().await.unwrap();
        assert!(matches!(first, ProtocolEvent::Session { .. }));

        let mut last = None;
        while let Some(event) = stream.next().await {
            last = Some(event);
        }
        assert!(matches!(last, Some(ProtocolEvent::Done { .. })));
    }
}
