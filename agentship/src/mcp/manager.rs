//! C4 — MCP Client Manager: owner-keyed cache of live `McpClient`s so two
//! tenants never share a connection.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex as AsyncMutex;

use super::{HttpMcpClient, MCPServerConfig, McpClient, OwnerId, ServerId, StdioMcpClient, TokenStore, Transport};

/// Typed cache key: a stdio server is process-global (one `OwnerId` of
/// `""`), while an HTTP/SSE server is keyed per real owner so bearer tokens
/// never cross tenants. Using a struct key instead of string
/// concatenation rules out accidental collisions between e.g. owner `"a:b"`
/// and server `"c"` vs. owner `"a"` and server `"b:c"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    server_id: ServerId,
    owner_id: OwnerId,
}

pub struct McpClientManager {
    clients: DashMap<CacheKey, Arc<dyn McpClient>>,
    // Guards concurrent first-time construction of the same key so two
    // simultaneous callers for a brand-new (server, owner) pair don't spawn
    // two subprocesses/sessions.
    construction_lock: AsyncMutex<()>,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl McpClientManager {
    pub fn new(token_store: Option<Arc<dyn TokenStore>>) -> Self {
        Self {
            clients: DashMap::new(),
            construction_lock: AsyncMutex::new(()),
            token_store,
        }
    }

    /// Returns the cached client for `(config.id, owner)`, constructing and
    /// caching one if absent. Per-owner keying is mandatory for every
    /// transport, including stdio: a misbehaving agent must not be able to
    /// exhaust another agent's subprocess or share its cancellation domain.
    /// An empty owner id degenerates to a single shared client, used by
    /// discovery tooling that has no per-agent identity to scope to.
    pub async fn get(
        &self,
        config: &MCPServerConfig,
        owner_id: &str,
    ) -> Result<Arc<dyn McpClient>, crate::error::McpClientError> {
        let key = CacheKey {
            server_id: config.id.clone(),
            owner_id: owner_id.to_string(),
        };

        if let Some(existing) = self.clients.get(&key) {
            return Ok(existing.clone());
        }

        let _guard = self.construction_lock.lock().await;
        if let Some(existing) = self.clients.get(&key) {
            return Ok(existing.clone());
        }

        let client: Arc<dyn McpClient> = match config.transport {
            Transport::Stdio => Arc::new(StdioMcpClient::new(config.clone())),
            Transport::Sse | Transport::Http => {
                Arc::new(HttpMcpClient::new(config, owner_id, self.token_store.clone())?)
            }
        };
        self.clients.insert(key, client.clone());
        Ok(client)
    }

    /// Closes and evicts every cached client (used on shutdown
    /// and between test cases).
    pub async fn close_all(&self) {
        let keys: Vec<CacheKey> = self.clients.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some((_, client)) = self.clients.remove(&key) {
                let _ = client.close().await;
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.clients.len()
    }
}
