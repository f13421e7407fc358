//! Postgres-backed `Checkpointer`: a `migrate()` that issues
//! `CREATE TABLE IF NOT EXISTS`, then plain `sqlx::query`/`query_as` against
//! a `PgPool`, gated behind a `postgres` feature so the default build does
//! not need a live database to compile or test.

#[cfg(feature = "postgres")]
mod inner {
    use async_trait::async_trait;
    use sqlx::PgPool;

    use crate::error::CheckpointError;
    use crate::message::Message;

    use super::super::checkpoint::{Checkpoint, CheckpointListItem};
    use super::super::checkpointer::Checkpointer;

    /// Postgres-backed checkpointer matching the DDL in
    /// (`agentship_checkpoints`, keyed by `thread_id`).
    pub struct PostgresSaver {
        pool: PgPool,
    }

    impl PostgresSaver {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        pub async fn connect(database_url: &str) -> Result<Self, CheckpointError> {
            let pool = PgPool::connect(database_url)
                .await
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let saver = Self::new(pool);
            saver.migrate().await?;
            Ok(saver)
        }

        pub async fn migrate(&self) -> Result<(), CheckpointError> {
            sqlx::query(
                r#"
                create table if not exists agentship_checkpoints (
                    thread_id text primary key,
                    messages_json jsonb not null,
                    updated_at timestamptz not null default now()
                )
                "#,
            )
            .execute(&self.pool)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok(())
        }
    }

    #[async_trait]
    impl Checkpointer for PostgresSaver {
        async fn put(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
            let json = serde_json::to_value(&checkpoint.messages)
                .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
            sqlx::query(
                "insert into agentship_checkpoints (thread_id, messages_json, updated_at)
                 values ($1, $2, now())
                 on conflict (thread_id) do update set messages_json = excluded.messages_json, updated_at = now()",
            )
            .bind(thread_id)
            .bind(json)
            .execute(&self.pool)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok(())
        }

        async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
            let row: Option<(serde_json::Value,)> =
                sqlx::query_as("select messages_json from agentship_checkpoints where thread_id = $1")
                    .bind(thread_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            match row {
                Some((json,)) => {
                    let messages: Vec<Message> =
                        serde_json::from_value(json).map_err(|e| CheckpointError::Serialization(e.to_string()))?;
                    Ok(Some(Checkpoint {
                        thread_id: thread_id.to_string(),
                        messages,
                    }))
                }
                None => Ok(None),
            }
        }

        async fn list(&self) -> Result<Vec<CheckpointListItem>, CheckpointError> {
            let rows: Vec<(String, serde_json::Value)> =
                sqlx::query_as("select thread_id, messages_json from agentship_checkpoints")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            rows.into_iter()
                .map(|(thread_id, json)| {
                    let messages: Vec<Message> =
                        serde_json::from_value(json).map_err(|e| CheckpointError::Serialization(e.to_string()))?;
                    Ok(CheckpointListItem {
                        thread_id,
                        message_count: messages.len(),
                    })
                })
                .collect()
        }
    }
}

#[cfg(feature = "postgres")]
pub use inner::PostgresSaver;
