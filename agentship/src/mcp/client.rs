//! C3 — MCP transport client contract shared by stdio and HTTP/SSE
//! implementations.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::McpClientError;

use super::MCPToolInfo;

/// One round-trip to a live MCP server. Both `list_tools` and `call_tool`
/// must be safe to call repeatedly on the same instance; implementations
/// own their own reconnect/retry policy internally around a single live
/// connection.
#[async_trait]
pub trait McpClient: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<MCPToolInfo>, McpClientError>;

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpClientError>;

    /// Releases the underlying connection/process. Best-effort: errors are
    /// swallowed by callers that only need `close` for cleanup on drop paths.
    async fn close(&self) -> Result<(), McpClientError>;
}
