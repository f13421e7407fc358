//! C3 — stdio MCP transport client: spawns the server as a subprocess and
//! speaks JSON-RPC over its stdin/stdout, with the same `StdioClientTransport`
//! callback wiring, `initialize` handshake, and `wait_for_result` loop that
//! answers `roots/list` with an empty list. The blocking `mcp_client` API is
//! driven from async code via `tokio::task::spawn_blocking`, and the session
//! is rebuilt whenever it is next used from a different Tokio runtime than
//! the one it was opened under — a runtime-handle comparison, not
//! string-matching on "cancel scope" (DESIGN.md).

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mcp_client::stdio::{
    JsonRpcMessage, StdioClientTransport, StdioClientTransportError, StdioServerParameters,
    StdioStream,
};
use mcp_core::{MessageId, NotificationMessage, RequestMessage, ResultMessage};
use serde_json::{json, Value};
use tokio::runtime::Handle;

use crate::error::McpClientError;

use super::{MCPServerConfig, MCPToolInfo};

const PROTOCOL_VERSION: &str = "2025-11-25";
const INITIALIZE_REQUEST_ID: &str = "agentship-mcp-initialize";

struct Session {
    transport: StdioClientTransport,
    receiver: mpsc::Receiver<JsonRpcMessage>,
}

impl Session {
    fn open(config: &MCPServerConfig) -> Result<Self, McpClientError> {
        let command = config
            .command
            .as_deref()
            .ok_or_else(|| McpClientError::Transport("stdio server has no command".into()))?;

        let (tx, rx) = mpsc::channel();
        let mut params = StdioServerParameters::new(command)
            .args(config.args.clone())
            .stderr(StdioStream::Null);
        if !config.env.is_empty() {
            params = params.env(config.env.clone());
        }

        let mut transport = StdioClientTransport::new(params);
        transport.on_message(move |msg| {
            let _ = tx.send(msg);
        });
        transport.on_error(|e| {
            tracing::warn!(error = %e, "mcp stdio transport error");
        });
        transport
            .start()
            .map_err(|e: StdioClientTransportError| McpClientError::Transport(e.to_string()))?;

        let mut session = Self {
            transport,
            receiver: rx,
        };
        session.initialize()?;
        Ok(session)
    }

    fn initialize(&mut self) -> Result<(), McpClientError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "clientInfo": { "name": "agentship", "version": env!("CARGO_PKG_VERSION") },
        });
        self.send_request(INITIALIZE_REQUEST_ID, "initialize", params)?;

        match self.wait_for_result(INITIALIZE_REQUEST_ID, Duration::from_secs(20))? {
            Some(result) if result.error.is_none() => {
                let notification = JsonRpcMessage::Notification(NotificationMessage::new(
                    "notifications/initialized",
                    Some(json!({})),
                ));
                self.transport
                    .send(&notification)
                    .map_err(|e| McpClientError::Transport(e.to_string()))?;
                Ok(())
            }
            Some(result) => Err(McpClientError::JsonRpc(
                result.error.map(|e| e.message).unwrap_or_else(|| "unknown".into()),
            )),
            None => Err(McpClientError::Timeout(Duration::from_secs(20))),
        }
    }

    fn send_request(&mut self, id: &str, method: &str, params: Value) -> Result<(), McpClientError> {
        let request = RequestMessage::new(id, method, params);
        self.transport
            .send(&JsonRpcMessage::Request(request))
            .map_err(|e| McpClientError::Transport(e.to_string()))
    }

    fn wait_for_result(
        &mut self,
        request_id: &str,
        timeout: Duration,
    ) -> Result<Option<ResultMessage>, McpClientError> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let remaining = deadline.saturating_duration_since(Instant::now()).min(Duration::from_secs(1));
            match self.receiver.recv_timeout(remaining) {
                Ok(JsonRpcMessage::Result(msg)) if message_id_matches(&msg.id, request_id) => {
                    return Ok(Some(msg));
                }
                Ok(JsonRpcMessage::Request(req)) if req.method == "roots/list" => {
                    let result = ResultMessage::success(req.id.clone(), json!({ "roots": [] }));
                    self.transport
                        .send(&JsonRpcMessage::Result(result))
                        .map_err(|e| McpClientError::Transport(e.to_string()))?;
                }
                Ok(JsonRpcMessage::Request(_)) | Ok(JsonRpcMessage::Result(_)) => {}
                Ok(JsonRpcMessage::Notification(_)) => {}
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(None)
    }

    fn call(&mut self, id: &str, method: &str, params: Value) -> Result<Value, McpClientError> {
        self.send_request(id, method, params)?;
        match self.wait_for_result(id, Duration::from_secs(60))? {
            Some(result) if result.error.is_none() => Ok(result.result.unwrap_or(Value::Null)),
            Some(result) => Err(McpClientError::JsonRpc(
                result.error.map(|e| e.message).unwrap_or_else(|| "unknown".into()),
            )),
            None => Err(McpClientError::Timeout(Duration::from_secs(60))),
        }
    }
}

fn message_id_matches(id: &MessageId, expected: &str) -> bool {
    id.as_str() == Some(expected)
}

struct OpenSession {
    opened_on_runtime: tokio::runtime::Id,
    session: Session,
}

/// Stdio MCP client. Lazily opens its subprocess on first use and re-opens it
/// whenever the calling Tokio runtime differs from the one it was spawned
/// under.
pub struct StdioMcpClient {
    config: MCPServerConfig,
    session: Mutex<Option<OpenSession>>,
}

impl StdioMcpClient {
    pub fn new(config: MCPServerConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    /// Runs `f` against an open session, (re)opening it first if needed.
    /// `mcp_client`'s transport is synchronous, so this always hops onto a
    /// blocking thread, away from the async executor.
    async fn with_session<F, R>(&self, f: F) -> Result<R, McpClientError>
    where
        F: FnOnce(&mut Session) -> Result<R, McpClientError> + Send + 'static,
        R: Send + 'static,
    {
        let current_runtime = Handle::current().id();
        let config = self.config.clone();
        let session_mutex = &self.session;

        // Mutex<Option<OpenSession>> cannot cross the spawn_blocking closure
        // by reference, so the check-and-(re)open-and-call sequence runs
        // entirely inside one blocking task holding the std Mutex guard.
        let guard_result = tokio::task::block_in_place(move || {
            let mut guard = session_mutex.lock().expect("stdio session lock poisoned");
            let needs_reopen = !matches!(&*guard, Some(open) if open.opened_on_runtime == current_runtime);
            if needs_reopen {
                let session = Session::open(&config)?;
                *guard = Some(OpenSession {
                    opened_on_runtime: current_runtime,
                    session,
                });
            }
            let open = guard.as_mut().expect("session just ensured");
            f(&mut open.session)
        });
        guard_result
    }
}

#[async_trait]
impl super::McpClient for StdioMcpClient {
    async fn list_tools(&self) -> Result<Vec<MCPToolInfo>, McpClientError> {
        let result = self
            .with_session(|s| s.call("agentship-mcp-tools-list", "tools/list", json!({})))
            .await?;
        parse_tool_list(&result)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpClientError> {
        let name = name.to_string();
        self.with_session(move |s| {
            let params = json!({ "name": name, "arguments": arguments });
            s.call("agentship-mcp-tools-call", "tools/call", params)
        })
        .await
    }

    async fn close(&self) -> Result<(), McpClientError> {
        *self.session.lock().expect("stdio session lock poisoned") = None;
        Ok(())
    }
}

fn parse_tool_list(result: &Value) -> Result<Vec<MCPToolInfo>, McpClientError> {
    let tools = result
        .get("tools")
        .and_then(|v| v.as_array())
        .ok_or_else(|| McpClientError::JsonRpc("tools/list result missing `tools` array".into()))?;
    tools
        .iter()
        .map(|t| {
            Ok(MCPToolInfo {
                name: t
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| McpClientError::JsonRpc("tool entry missing name".into()))?
                    .to_string(),
                description: t.get("description").and_then(|v| v.as_str()).map(String::from),
                input_schema: t.get("inputSchema").cloned().unwrap_or(json!({})),
            })
        })
        .collect()
}
