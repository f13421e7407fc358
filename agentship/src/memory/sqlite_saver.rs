//! SQLite-backed `Checkpointer` (`AGENT_SESSION_STORE_URI`
//! single-node case), simplified to store one JSON-serialized message
//! history per `thread_id` rather than a multi-version graph-channel
//! schema (DESIGN.md).

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::error::CheckpointError;
use crate::message::Message;

use super::checkpoint::{Checkpoint, CheckpointListItem};
use super::checkpointer::Checkpointer;

/// SQLite-backed checkpointer, single connection guarded by a blocking
/// mutex and driven through `spawn_blocking` (rusqlite has no async API).
pub struct SqliteSaver {
    conn: Mutex<Connection>,
}

impl SqliteSaver {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let conn = Connection::open(path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, CheckpointError> {
        let conn = Connection::open_in_memory().map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn init_schema(conn: &Connection) -> Result<(), CheckpointError> {
        conn.execute(
            "create table if not exists agentship_checkpoints (
                thread_id text primary key,
                messages_json text not null
            )",
            [],
        )
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Checkpointer for SqliteSaver {
    async fn put(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let json = serde_json::to_string(&checkpoint.messages)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let conn = self.conn.lock().map_err(|_| CheckpointError::Storage("sqlite lock poisoned".into()))?;
        conn.execute(
            "insert into agentship_checkpoints (thread_id, messages_json) values (?1, ?2)
             on conflict(thread_id) do update set messages_json = excluded.messages_json",
            params![thread_id, json],
        )
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let conn = self.conn.lock().map_err(|_| CheckpointError::Storage("sqlite lock poisoned".into()))?;
        let result: rusqlite::Result<String> = conn.query_row(
            "select messages_json from agentship_checkpoints where thread_id = ?1",
            params![thread_id],
            |row| row.get(0),
        );
        match result {
            Ok(json) => {
                let messages: Vec<Message> =
                    serde_json::from_str(&json).map_err(|e| CheckpointError::Serialization(e.to_string()))?;
                Ok(Some(Checkpoint {
                    thread_id: thread_id.to_string(),
                    messages,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CheckpointError::Storage(e.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let conn = self.conn.lock().map_err(|_| CheckpointError::Storage("sqlite lock poisoned".into()))?;
        let mut stmt = conn
            .prepare("select thread_id, messages_json from agentship_checkpoints")
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let thread_id: String = row.get(0)?;
                let messages_json: String = row.get(1)?;
                Ok((thread_id, messages_json))
            })
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            let (thread_id, messages_json) = row.map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let messages: Vec<Message> = serde_json::from_str(&messages_json)
                .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
            items.push(CheckpointListItem {
                thread_id,
                message_count: messages.len(),
            });
        }
        Ok(items)
    }
}
