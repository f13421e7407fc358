//! C6 — Session Store: a single `ensure_session` contract
//! behind two implementations, one per engine. The native engine's store
//! wraps [`crate::memory::Checkpointer`]; the orchestrated engine's store
//! wraps the framework's own session service (an external collaborator,
//! represented here by the [`FrameworkSessionService`] trait so the engine
//! can be exercised without a live framework).

mod native;
mod orchestrated;

pub use native::NativeSessionStore;
pub use orchestrated::{FrameworkSessionService, InMemoryFrameworkSessionService, OrchestratedSessionStore};

use async_trait::async_trait;

use crate::error::CheckpointError;

/// The one contract both session stores expose.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Ensures a session exists for `(user_id, session_id)`. Idempotent:
    /// calling it again for an existing session is success, not an error.
    async fn ensure_session(&self, user_id: &str, session_id: &str) -> Result<(), CheckpointError>;
}
