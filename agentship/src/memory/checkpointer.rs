//! The `Checkpointer` trait both session stores are built on. A
//! generic-over-state-shape type parameter is dropped in favor of a
//! concrete `Checkpoint`: AgentShip has exactly one state shape to
//! persist — a message history — so there is nothing left to vary over.

use async_trait::async_trait;

use crate::error::CheckpointError;

use super::checkpoint::{Checkpoint, CheckpointListItem};

/// Persists and loads the message history for one `thread_id`, the key
/// under which the checkpointer stores each conversation (see
/// [`thread_id`] for how it's built from `user_id`/`session_id`).
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Overwrites the checkpoint for `thread_id` with `checkpoint`.
    async fn put(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;

    /// Loads the current checkpoint for `thread_id`, or `None` if the thread
    /// has never been persisted — a session is created on first use.
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    /// Lists every thread this checkpointer has persisted, with its message
    /// count.
    async fn list(&self) -> Result<Vec<CheckpointListItem>, CheckpointError>;
}

/// Builds the thread id the native engine and its checkpointer must agree on.
pub fn thread_id(user_id: &str, session_id: &str) -> String {
    format!("{user_id}:{session_id}")
}
