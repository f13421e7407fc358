//! The checkpoint payload: AgentShip's native engine
//! persists one linear message history per thread, not a multi-channel
//! graph state (`channel_versions`/`versions_seen`/`pending_sends`) — a
//! single ReAct-style tool loop has no concurrent graph nodes to reconcile,
//! so that machinery is simplified away (see DESIGN.md).

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// One persisted snapshot of a thread's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub messages: Vec<Message>,
}

impl Checkpoint {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
        }
    }
}

/// Summary returned by `Checkpointer::list`. Time-travel to a prior version
/// isn't exposed by AgentShip's linear history, but the shape is kept so a
/// caller can audit how many turns a thread has accumulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointListItem {
    pub thread_id: String,
    pub message_count: usize,
}
