//! C5 — the engine-facing `Tool` contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolSourceError;

/// One JSON-Schema-described parameter.
#[derive(Debug, Clone)]
pub struct ToolParameter {
    pub name: String,
    pub type_name: String,
    pub required: bool,
    pub description: Option<String>,
}

/// Declarative shape of a tool, independent of any one provider SDK. The
/// prompt builder reads `parameters` to render the "## Available Tools"
/// section; engines read `input_schema` to hand the LLM a native JSON-Schema.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub parameters: Vec<ToolParameter>,
    /// Lets observability distinguish a sub-agent delegation from an
    /// ordinary function or MCP call.
    pub is_agent_tool: bool,
}

/// One callable tool, already resolved from its `ToolDeclaration` (function,
/// agent, or MCP reference) into a uniform async interface both engines
/// drive identically.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    /// Invokes the tool. Implementations never propagate invocation errors
    /// up as a hard failure — the engine's call site converts any
    /// `Err` into a descriptive string so the LLM can recover; this trait
    /// still returns a `Result` so MCP/transport-level failures are visible
    /// to tests and to the one call site that stringifies them.
    async fn call(&self, arguments: Value, ctx: &ToolCallContext) -> Result<Value, ToolSourceError>;
}

/// Context threaded into every tool call: the acting user/session, used both
/// for the placeholder-`user_id` injection rule and for
/// scoping MCP clients and sub-agent sessions to the right owner.
#[derive(Debug, Clone)]
pub struct ToolCallContext {
    pub user_id: String,
    pub session_id: String,
}
