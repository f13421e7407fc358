//! MCP (Model Context Protocol) subsystem: registry (C2), transport clients
//! (C3), and the per-owner client manager (C4) —

mod client;
mod http;
mod manager;
mod registry;
mod stdio;
mod token_store;

pub use client::McpClient;
pub use http::HttpMcpClient;
pub use manager::McpClientManager;
pub use registry::McpRegistry;
pub use stdio::StdioMcpClient;
pub use token_store::{InMemoryTokenStore, StoredToken, TokenStore};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transport kind for one MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Stdio,
    Sse,
    Http,
}

/// Auth scheme for an HTTP/SSE MCP server.
///
/// Holds env-var **names**, never resolved secret values: resolution happens
/// inside the OAuth route or the transport client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MCPAuthConfig {
    #[serde(rename = "type", default)]
    pub kind: AuthKind,
    #[serde(default)]
    pub token_var: Option<String>,
    #[serde(default)]
    pub client_id_env: Option<String>,
    #[serde(default)]
    pub client_secret_env: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    #[default]
    None,
    EnvVar,
    BearerToken,
    Oauth,
    ApiKey,
}

/// One entry of the MCP server definitions file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPServerConfig {
    pub id: String,
    pub transport: Transport,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub auth: MCPAuthConfig,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl MCPServerConfig {
    /// Invariant: stdio requires a command; sse/http require a URL.
    pub fn validate(&self) -> Result<(), String> {
        match self.transport {
            Transport::Stdio if self.command.is_none() => {
                Err(format!("server {}: stdio transport requires `command`", self.id))
            }
            Transport::Sse | Transport::Http if self.url.is_none() => Err(format!(
                "server {}: {:?} transport requires `url`",
                self.id, self.transport
            )),
            _ => Ok(()),
        }
    }
}

/// Descriptive, engine-agnostic info about one remote tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPToolInfo {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Identifies the tenant an MCP client is allocated to. An empty owner
/// degenerates to a shared client.
pub type OwnerId = String;
pub type ServerId = String;
