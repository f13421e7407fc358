//! In-memory `Checkpointer`: the default when `AGENT_SHORT_TERM_MEMORY` isn't
//! set to `Database`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::CheckpointError;

use super::checkpoint::{Checkpoint, CheckpointListItem};
use super::checkpointer::Checkpointer;

#[derive(Default)]
pub struct MemorySaver {
    threads: RwLock<HashMap<String, Checkpoint>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn put(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        self.threads
            .write()
            .map_err(|_| CheckpointError::Storage("memory saver lock poisoned".into()))?
            .insert(thread_id.to_string(), checkpoint.clone());
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        Ok(self
            .threads
            .read()
            .map_err(|_| CheckpointError::Storage("memory saver lock poisoned".into()))?
            .get(thread_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        Ok(self
            .threads
            .read()
            .map_err(|_| CheckpointError::Storage("memory saver lock poisoned".into()))?
            .values()
            .map(|c| CheckpointListItem {
                thread_id: c.thread_id.clone(),
                message_count: c.messages.len(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let saver = MemorySaver::new();
        let mut cp = Checkpoint::new("u1:s1");
        cp.messages.push(Message::user("hi"));
        saver.put("u1:s1", &cp).await.unwrap();
        let loaded = saver.get("u1:s1").await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 1);
    }

    #[tokio::test]
    async fn unknown_thread_returns_none() {
        let saver = MemorySaver::new();
        assert!(saver.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_puts_grow_history_length_strictly() {
        // : running the same (user_id,
        // session_id) twice sequentially must observe strictly increasing
        // history length.
        let saver = MemorySaver::new();
        let mut cp = Checkpoint::new("u1:s1");
        cp.messages.push(Message::user("first"));
        saver.put("u1:s1", &cp).await.unwrap();
        let first_len = saver.get("u1:s1").await.unwrap().unwrap().messages.len();

        cp.messages.push(Message::assistant("reply"));
        cp.messages.push(Message::user("second"));
        saver.put("u1:s1", &cp).await.unwrap();
        let second_len = saver.get("u1:s1").await.unwrap().unwrap().messages.len();

        assert!(second_len > first_len);
    }
}
