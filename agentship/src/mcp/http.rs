//! C3 — HTTP/SSE MCP transport client: POST-based JSON-RPC over `reqwest`,
//! the `MCP-Session-Id` capture/replay dance, and `parse_json_rpc_from_body`
//! handling both a plain JSON response and an SSE (`data:` line) response.
//! Adds auth-header injection from a `TokenStore` and 401 handling — an
//! expired bearer token without a refresh path surfaces as
//! `McpClientError::Unauthorized` for the caller to act on.

use std::sync::Mutex;

use async_trait::async_trait;
use mcp_core::{ErrorObject, MessageId, NotificationMessage, RequestMessage, ResultMessage};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::McpClientError;

use super::{AuthKind, MCPServerConfig, MCPToolInfo};
use super::token_store::TokenStore;

const MCP_PROTOCOL_VERSION: &str = "2025-11-25";
const INITIALIZE_REQUEST_ID: &str = "agentship-mcp-initialize";

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    id: Option<MessageId>,
    result: Option<Value>,
    error: Option<JsonRpcErrorBody>,
}

fn parse_json_rpc_from_body(
    body: &str,
    content_type: Option<&reqwest::header::HeaderValue>,
) -> Result<JsonRpcResponse, McpClientError> {
    let is_sse = content_type
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("text/event-stream"))
        .unwrap_or(false);

    if !is_sse {
        return serde_json::from_str(body).map_err(|e| McpClientError::Transport(format!("response json: {e}")));
    }

    let mut data_buffer = String::new();
    let mut try_flush = |buf: &mut String| -> Option<JsonRpcResponse> {
        if buf.is_empty() {
            return None;
        }
        let parsed = serde_json::from_str::<JsonRpcResponse>(buf).ok();
        if let Some(r) = &parsed {
            if r.result.is_none() && r.error.is_none() {
                return None;
            }
        }
        if parsed.is_some() {
            buf.clear();
        }
        parsed
    };

    for line in body.lines() {
        if let Some(data) = line.strip_prefix("data: ") {
            if data == "[DONE]" || data.is_empty() {
                if let Some(r) = try_flush(&mut data_buffer) {
                    return Ok(r);
                }
                data_buffer.clear();
                continue;
            }
            if data_buffer.is_empty() {
                data_buffer = data.to_string();
            } else {
                data_buffer.push('\n');
                data_buffer.push_str(data);
            }
            if let Some(r) = try_flush(&mut data_buffer) {
                return Ok(r);
            }
        } else if line.trim().is_empty() {
            if let Some(r) = try_flush(&mut data_buffer) {
                return Ok(r);
            }
        }
    }
    if let Some(r) = try_flush(&mut data_buffer) {
        return Ok(r);
    }
    Err(McpClientError::Transport(
        "SSE stream: no JSON-RPC response (result/error) found".into(),
    ))
}

/// HTTP/SSE MCP client, one per `(server, owner)` pair per the client
/// manager's cache. Re-initializes lazily on first call.
pub struct HttpMcpClient {
    client: Client,
    url: String,
    extra_headers: Vec<(String, String)>,
    auth: super::MCPAuthConfig,
    owner_id: String,
    token_store: Option<std::sync::Arc<dyn TokenStore>>,
    session_id: Mutex<Option<String>>,
    initialized: Mutex<bool>,
}

impl HttpMcpClient {
    pub fn new(
        config: &MCPServerConfig,
        owner_id: impl Into<String>,
        token_store: Option<std::sync::Arc<dyn TokenStore>>,
    ) -> Result<Self, McpClientError> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| McpClientError::Transport("http/sse server has no url".into()))?;
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| McpClientError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url,
            extra_headers: Vec::new(),
            auth: config.auth.clone(),
            owner_id: owner_id.into(),
            token_store,
            session_id: Mutex::new(None),
            initialized: Mutex::new(false),
        })
    }

    async fn auth_header(&self) -> Result<Option<(String, String)>, McpClientError> {
        match self.auth.kind {
            AuthKind::None => Ok(None),
            AuthKind::EnvVar | AuthKind::BearerToken | AuthKind::ApiKey => {
                let var = self
                    .auth
                    .token_var
                    .as_deref()
                    .ok_or_else(|| McpClientError::Transport("auth configured without token_var".into()))?;
                let value = std::env::var(var)
                    .map_err(|_| McpClientError::Transport(format!("env var {var} not set")))?;
                Ok(Some(("Authorization".into(), format!("Bearer {value}"))))
            }
            AuthKind::Oauth => {
                let store = self
                    .token_store
                    .as_ref()
                    .ok_or_else(|| McpClientError::Transport("oauth configured without a TokenStore".into()))?;
                match store.get(&self.owner_id, &self.url).await {
                    Some(token) => Ok(Some(("Authorization".into(), format!("Bearer {}", token.access_token)))),
                    None => Err(McpClientError::ReconnectRequired),
                }
            }
        }
    }

    async fn ensure_initialized(&self) -> Result<(), McpClientError> {
        if *self.initialized.lock().expect("http session lock poisoned") {
            return Ok(());
        }
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "clientInfo": { "name": "agentship", "version": env!("CARGO_PKG_VERSION") },
        });
        let _ = self.post(INITIALIZE_REQUEST_ID, "initialize", params).await?;

        let notification = NotificationMessage::new("notifications/initialized", Some(json!({})));
        let body = serde_json::to_vec(&notification).map_err(|e| McpClientError::Transport(e.to_string()))?;
        let mut req = self.base_request(body);
        if let Some((k, v)) = self.auth_header().await? {
            req = req.header(k, v);
        }
        let resp = req.send().await.map_err(|e| McpClientError::Transport(e.to_string()))?;
        if resp.status() != reqwest::StatusCode::ACCEPTED && !resp.status().is_success() {
            return Err(McpClientError::Transport(format!(
                "notifications/initialized HTTP {}",
                resp.status()
            )));
        }
        *self.initialized.lock().expect("http session lock poisoned") = true;
        Ok(())
    }

    fn base_request(&self, body: Vec<u8>) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .header("MCP-Protocol-Version", MCP_PROTOCOL_VERSION)
            .body(body);
        for (k, v) in &self.extra_headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req
    }

    async fn post(&self, id: &str, method: &str, params: Value) -> Result<Value, McpClientError> {
        let request = RequestMessage::new(id, method, params);
        let body = serde_json::to_vec(&request).map_err(|e| McpClientError::Transport(e.to_string()))?;
        let mut req = self.base_request(body);
        if let Some((k, v)) = self.auth_header().await? {
            req = req.header(k, v);
        }
        if let Some(sid) = self.session_id.lock().expect("http session lock poisoned").clone() {
            req = req.header("MCP-Session-Id", sid);
        }

        let resp = req.send().await.map_err(|e| McpClientError::Transport(e.to_string()))?;
        let status = resp.status();
        if let Some(sid) = resp
            .headers()
            .get("MCP-Session-Id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
        {
            *self.session_id.lock().expect("http session lock poisoned") = Some(sid);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(McpClientError::Unauthorized);
        }
        if status == reqwest::StatusCode::ACCEPTED {
            return Ok(Value::Null);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(McpClientError::Transport(format!("{method} HTTP {status}: {text}")));
        }
        let content_type = resp.headers().get("content-type").cloned();
        let text = resp.text().await.map_err(|e| McpClientError::Transport(e.to_string()))?;
        let parsed = parse_json_rpc_from_body(&text, content_type.as_ref())?;
        if let Some(err) = parsed.error {
            let _ = ErrorObject::new(err.code as i32, err.message.clone(), None);
            return Err(McpClientError::JsonRpc(err.message));
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl super::McpClient for HttpMcpClient {
    async fn list_tools(&self) -> Result<Vec<MCPToolInfo>, McpClientError> {
        self.ensure_initialized().await?;
        let result = self.post("agentship-mcp-tools-list", "tools/list", json!({})).await?;
        parse_tool_list(&result)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpClientError> {
        self.ensure_initialized().await?;
        let params = json!({ "name": name, "arguments": arguments });
        self.post("agentship-mcp-tools-call", "tools/call", params).await
    }

    async fn close(&self) -> Result<(), McpClientError> {
        *self.initialized.lock().expect("http session lock poisoned") = false;
        *self.session_id.lock().expect("http session lock poisoned") = None;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_response() {
        let body = r#"{"id":"x","result":{"tools":[]}}"#;
        let parsed = parse_json_rpc_from_body(body, None).unwrap();
        assert!(parsed.result.is_some());
    }

    #[test]
    fn parses_sse_response() {
        let body = "data: {\"id\":\"x\",\"result\":{\"ok\":true}}\n\n";
        let content_type = reqwest::header::HeaderValue::from_static("text/event-stream");
        let parsed = parse_json_rpc_from_body(body, Some(&content_type)).unwrap();
        assert_eq!(parsed.result.unwrap(), json!({"ok": true}));
    }

    #[test]
    fn sse_without_terminal_blank_line_still_flushes() {
        let body = "data: {\"id\":\"x\",\"result\":{\"ok\":true}}";
        let content_type = reqwest::header::HeaderValue::from_static("text/event-stream");
        let parsed = parse_json_rpc_from_body(body, Some(&content_type)).unwrap();
        assert_eq!(parsed.result.unwrap(), json!({"ok": true}));
    }

    #[test]
    fn parse_tool_list_extracts_fields() {
        let result = json!({"tools": [{"name": "search", "description": "Search", "inputSchema": {}}]});
        let tools = parse_tool_list(&result).unwrap();
        assert_eq!(tools[0].name, "search");
    }
}
