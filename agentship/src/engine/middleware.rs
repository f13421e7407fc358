//! Middleware engine wrapper: `before_run` transforms the
//! input through an ordered middleware chain; `after_run` runs in reverse
//! order over the inner engine's output. Streaming is pass-through — a
//! stream's events are never rewritten here, only the input that
//! produces them.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;

use super::{Engine, EngineCapabilities, EventStream, RunInput};

/// One middleware stage. Both hooks default to identity, so a middleware
/// that only cares about one side doesn't need to implement the other.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn before_run(&self, input: RunInput) -> Result<RunInput, EngineError> {
        Ok(input)
    }

    async fn after_run(&self, output: Value) -> Result<Value, EngineError> {
        Ok(output)
    }
}

pub struct MiddlewareEngine {
    inner: Arc<dyn Engine>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareEngine {
    pub fn new(inner: Arc<dyn Engine>, middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self { inner, middlewares }
    }

    async fn before_run(&self, mut input: RunInput) -> Result<RunInput, EngineError> {
        for mw in &self.middlewares {
            input = mw.before_run(input).await?;
        }
        Ok(input)
    }

    async fn after_run(&self, mut output: Value) -> Result<Value, EngineError> {
        for mw in self.middlewares.iter().rev() {
            output = mw.after_run(output).await?;
        }
        Ok(output)
    }
}

#[async_trait]
impl Engine for MiddlewareEngine {
    fn engine_name(&self) -> &str {
        self.inner.engine_name()
    }

    fn capabilities(&self) -> EngineCapabilities {
        self.inner.capabilities()
    }

    async fn rebuild(&self) -> Result<(), EngineError> {
        self.inner.rebuild().await
    }

    async fn run(&self, user_id: &str, session_id: &str, input: RunInput) -> Result<Value, EngineError> {
        let input = self.before_run(input).await?;
        let output = self.inner.run(user_id, session_id, input).await?;
        self.after_run(output).await
    }

    async fn run_stream(&self, user_id: &str, session_id: &str, input: RunInput) -> EventStream {
        match self.before_run(input).await {
            Ok(input) => self.inner.run_stream(user_id, session_id, input).await,
            Err(e) => {
                let (tx, rx) = tokio::sync::mpsc::channel(4);
                let _ = tx
                    .send(stream_event::ProtocolEvent::Error { agent: self.engine_name().to_string(), timestamp: now(), message: e.to_string() })
                    .await;
                let _ = tx.send(stream_event::ProtocolEvent::Done { agent: self.engine_name().to_string(), timestamp: now() }).await;
                Box::pin(tokio_stream::wrappers::ReceiverStream::new(rx))
            }
        }
    }
}

fn now() -> String {
    super::native::rfc3339_now()
}
