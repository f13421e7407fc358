//! Native engine's session store: wraps a [`Checkpointer`] behind an async,
//! mutex-protected, double-checked lazy initializer. A `refresh`
//! operation resets the connection on transient errors.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::CheckpointError;
use crate::memory::{thread_id, Checkpoint, Checkpointer};

use super::SessionStore;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Builds a fresh checkpointer connection. Boxed so the same
/// `NativeSessionStore` can be constructed against `MemorySaver`,
/// `SqliteSaver`, or `PostgresSaver` without a generic parameter leaking
/// into every caller (`AGENT_SESSION_STORE_URI` selects which one
/// at startup).
pub type CheckpointerFactory = Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn Checkpointer>, CheckpointError>> + Send + Sync>;

/// Session store for the native engine.
pub struct NativeSessionStore {
    factory: CheckpointerFactory,
    checkpointer: Mutex<Option<Arc<dyn Checkpointer>>>,
}

impl NativeSessionStore {
    pub fn new(factory: CheckpointerFactory) -> Self {
        Self {
            factory,
            checkpointer: Mutex::new(None),
        }
    }

    /// Convenience constructor around an already-built checkpointer (the
    /// common case in tests and for `MemorySaver`/`SqliteSaver`, which have
    /// no connection to lazily establish).
    pub fn with_checkpointer(checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self {
            factory: Arc::new(move || {
                let checkpointer = checkpointer.clone();
                Box::pin(async move { Ok(checkpointer) })
            }),
            checkpointer: Mutex::new(None),
        }
    }

    /// Returns the live checkpointer, constructing it on first use.
    /// Double-checked: the lock is re-inspected after acquiring it in case
    /// a concurrent caller won the race while this one was waiting.
    pub async fn get_checkpointer(&self) -> Result<Arc<dyn Checkpointer>, CheckpointError> {
        {
            let guard = self.checkpointer.lock().await;
            if let Some(c) = guard.as_ref() {
                return Ok(c.clone());
            }
        }
        let mut guard = self.checkpointer.lock().await;
        if let Some(c) = guard.as_ref() {
            return Ok(c.clone());
        }
        let built = (self.factory)().await?;
        *guard = Some(built.clone());
        Ok(built)
    }

    /// Resets the cached connection so the next `get_checkpointer` call
    /// reconnects from scratch, per the retry policy's connection-refresh
    /// behavior on transient errors.
    pub async fn refresh(&self) {
        *self.checkpointer.lock().await = None;
    }

    pub async fn load(&self, user_id: &str, session_id: &str) -> Result<Vec<crate::message::Message>, CheckpointError> {
        let checkpointer = self.get_checkpointer().await?;
        let tid = thread_id(user_id, session_id);
        Ok(checkpointer.get(&tid).await?.map(|c| c.messages).unwrap_or_default())
    }

    pub async fn save(
        &self,
        user_id: &str,
        session_id: &str,
        messages: Vec<crate::message::Message>,
    ) -> Result<(), CheckpointError> {
        let checkpointer = self.get_checkpointer().await?;
        let tid = thread_id(user_id, session_id);
        checkpointer.put(&tid, &Checkpoint { thread_id: tid.clone(), messages }).await
    }
}

#[async_trait]
impl SessionStore for NativeSessionStore {
    async fn ensure_session(&self, user_id: &str, session_id: &str) -> Result<(), CheckpointError> {
        let checkpointer = self.get_checkpointer().await?;
        let tid = thread_id(user_id, session_id);
        if checkpointer.get(&tid).await?.is_none() {
            checkpointer.put(&tid, &Checkpoint::new(tid.clone())).await?;
        }
        Ok(())
    }
}
