//! Error taxonomy.
//!
//! One `thiserror` enum per subsystem, each convertible into the facade's
//! `AgentError` via `#[from]` — `CheckpointError`, `McpSessionError`,
//! `RunError`, and the rest defined and composed independently.

use thiserror::Error;

/// Errors from the MCP server registry (C2): file load, parse, lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("read registry file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse registry file {path}: {message}")]
    Parse { path: String, message: String },
    #[error("no registry file found (set {0} or place mcp_servers.{{json,yaml,yml}} in cwd)")]
    NotFound(&'static str),
    #[error("unknown MCP server id: {0}")]
    UnknownServer(String),
}

/// Errors from MCP transport clients (C3) and the client manager (C4).
#[derive(Debug, Error)]
pub enum McpClientError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("JSON-RPC error: {0}")]
    JsonRpc(String),
    #[error("token expired and no refresh token available; caller must reconnect")]
    ReconnectRequired,
    #[error("unauthorized (401)")]
    Unauthorized,
    #[error("timeout after {0:?}")]
    Timeout(std::time::Duration),
}

/// Errors from tool construction/invocation (C5).
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("mcp/transport error: {0}")]
    Transport(String),
    #[error("json-rpc error: {0}")]
    JsonRpc(String),
    #[error("sub-agent call failed: {0}")]
    SubAgent(String),
}

impl From<RegistryError> for ToolSourceError {
    fn from(e: RegistryError) -> Self {
        ToolSourceError::NotFound(e.to_string())
    }
}

impl From<McpClientError> for ToolSourceError {
    fn from(e: McpClientError) -> Self {
        match e {
            McpClientError::Transport(m) => ToolSourceError::Transport(m),
            McpClientError::JsonRpc(m) => ToolSourceError::JsonRpc(m),
            McpClientError::ReconnectRequired => {
                ToolSourceError::Transport("reconnect required".into())
            }
            McpClientError::Unauthorized => ToolSourceError::Transport("unauthorized".into()),
            McpClientError::Timeout(d) => ToolSourceError::Transport(format!("timeout after {:?}", d)),
        }
    }
}

/// Errors from the session/checkpoint layer (C6).
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Errors fatal to a single turn rather than the whole process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("llm call failed: {0}")]
    Llm(String),
    #[error("rate limited after exhausting retries")]
    RateLimited,
    #[error("max tool rounds ({0}) reached")]
    MaxRoundsReached(u32),
    #[error("output did not validate against the declared schema: {0}")]
    OutputSchema(String),
    #[error("tool error: {0}")]
    Tool(#[from] ToolSourceError),
    #[error("session error: {0}")]
    Session(#[from] CheckpointError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    McpClient(#[from] McpClientError),
    #[error("call depth limit ({0}) exceeded; likely agent-tool cycle")]
    CallDepthExceeded(u32),
}

/// Top-level error returned to the facade. Config errors here are fatal to
/// the process; everything else is fatal only to the current turn.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("config: {0}")]
    Config(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
}

impl From<ToolSourceError> for AgentError {
    fn from(e: ToolSourceError) -> Self {
        AgentError::Engine(EngineError::Tool(e))
    }
}

impl From<CheckpointError> for AgentError {
    fn from(e: CheckpointError) -> Self {
        AgentError::Engine(EngineError::Session(e))
    }
}

impl From<RegistryError> for AgentError {
    fn from(e: RegistryError) -> Self {
        AgentError::Engine(EngineError::Registry(e))
    }
}

impl From<McpClientError> for AgentError {
    fn from(e: McpClientError) -> Self {
        AgentError::Engine(EngineError::McpClient(e))
    }
}
