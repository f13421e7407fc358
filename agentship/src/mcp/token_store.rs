//! OAuth token storage for HTTP/SSE MCP servers, keyed by `(user_id,
//! server_url)`. The encrypted-at-rest, Postgres-backed implementation is a
//! deployment concern kept out of this crate; this module provides the
//! trait plus an in-memory implementation used by tests and by callers who
//! inject their own store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<SystemTime>,
}

impl StoredToken {
    pub fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if at <= SystemTime::now())
    }
}

/// Keyed by `(user_id, server_url)` so two agents acting on behalf of
/// different users never share a bearer token for the same server,
/// mirroring the client manager's owner-isolation invariant.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns a non-expired token, refreshing first if a refresh token is
    /// available and the stored token has expired. Returns `None` when no
    /// token is on file or refresh is unavailable/fails — the caller then
    /// surfaces `McpClientError::ReconnectRequired`.
    async fn get(&self, user_id: &str, server_url: &str) -> Option<StoredToken>;

    async fn put(&self, user_id: &str, server_url: &str, token: StoredToken);

    async fn remove(&self, user_id: &str, server_url: &str);
}

#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<(String, String), StoredToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, user_id: &str, server_url: &str) -> Option<StoredToken> {
        let key = (user_id.to_string(), server_url.to_string());
        let token = self.tokens.lock().expect("token store lock poisoned").get(&key).cloned()?;
        if token.is_expired() {
            // No refresh endpoint is reachable from this generic in-memory
            // store; a real deployment's TokenStore impl performs the OAuth
            // refresh round-trip here and re-`put`s the result.
            return None;
        }
        Some(token)
    }

    async fn put(&self, user_id: &str, server_url: &str, token: StoredToken) {
        let key = (user_id.to_string(), server_url.to_string());
        self.tokens.lock().expect("token store lock poisoned").insert(key, token);
    }

    async fn remove(&self, user_id: &str, server_url: &str) {
        let key = (user_id.to_string(), server_url.to_string());
        self.tokens.lock().expect("token store lock poisoned").remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemoryTokenStore::new();
        store
            .put(
                "user-1",
                "https://example.com/mcp",
                StoredToken {
                    access_token: "tok".into(),
                    refresh_token: None,
                    expires_at: None,
                },
            )
            .await;
        let got = store.get("user-1", "https://example.com/mcp").await.unwrap();
        assert_eq!(got.access_token, "tok");
    }

    #[tokio::test]
    async fn expired_token_without_refresh_returns_none() {
        let store = InMemoryTokenStore::new();
        store
            .put(
                "user-1",
                "https://example.com/mcp",
                StoredToken {
                    access_token: "tok".into(),
                    refresh_token: None,
                    expires_at: Some(SystemTime::now() - Duration::from_secs(10)),
                },
            )
            .await;
        assert!(store.get("user-1", "https://example.com/mcp").await.is_none());
    }

    #[tokio::test]
    async fn different_users_never_share_a_token() {
        let store = InMemoryTokenStore::new();
        store
            .put(
                "user-1",
                "https://example.com/mcp",
                StoredToken {
                    access_token: "user-1-token".into(),
                    refresh_token: None,
                    expires_at: None,
                },
            )
            .await;
        assert!(store.get("user-2", "https://example.com/mcp").await.is_none());
    }
}
