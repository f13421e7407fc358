//! Orchestrated engine's session store: wraps the framework's own session
//! service. The framework itself is an out-of-scope external
//! collaborator ; [`FrameworkSessionService`] is the narrow
//! interface the core consumes, with an in-memory stand-in used by tests and
//! by callers who have not wired a real framework session service yet.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CheckpointError;

use super::SessionStore;

/// The external framework's session-creation call, wrapping the
/// framework's own session service.
#[async_trait]
pub trait FrameworkSessionService: Send + Sync {
    /// Creates a session; an "already exists" condition is not an error.
    async fn create_session(&self, user_id: &str, session_id: &str) -> Result<(), CheckpointError>;
}

/// In-memory `FrameworkSessionService`, standing in for the real framework
/// runner in tests — an out-of-scope external collaborator the core only
/// consumes via a narrow interface.
#[derive(Default)]
pub struct InMemoryFrameworkSessionService {
    sessions: Mutex<HashSet<(String, String)>>,
}

impl InMemoryFrameworkSessionService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FrameworkSessionService for InMemoryFrameworkSessionService {
    async fn create_session(&self, user_id: &str, session_id: &str) -> Result<(), CheckpointError> {
        self.sessions
            .lock()
            .map_err(|_| CheckpointError::Storage("framework session service lock poisoned".into()))?
            .insert((user_id.to_string(), session_id.to_string()));
        Ok(())
    }
}

pub struct OrchestratedSessionStore {
    service: std::sync::Arc<dyn FrameworkSessionService>,
}

impl OrchestratedSessionStore {
    pub fn new(service: std::sync::Arc<dyn FrameworkSessionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SessionStore for OrchestratedSessionStore {
    async fn ensure_session(&self, user_id: &str, session_id: &str) -> Result<(), CheckpointError> {
        self.service.create_session(user_id, session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_session_is_idempotent() {
        let store = OrchestratedSessionStore::new(std::sync::Arc::new(InMemoryFrameworkSessionService::new()));
        store.ensure_session("u1", "s1").await.unwrap();
        store.ensure_session("u1", "s1").await.unwrap();
    }
}
