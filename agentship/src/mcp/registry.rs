//! C2 — MCP Server Registry: loads the server-definitions file, normalizes
//! shorthand entries, and resolves `${VAR}` placeholders.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;

use crate::error::RegistryError;

use super::MCPServerConfig;

const ENV_OVERRIDE: &str = "MCP_SERVERS_CONFIG";
const DEFAULT_FILENAMES: &[&str] = &[
    "mcp_servers.json",
    "mcp_servers.yaml",
    "mcp_servers.yml",
];

/// Process-wide registry of `MCPServerConfig`s keyed by id. `reset` exists
/// so tests can clear it between cases without restarting the process.
#[derive(Default)]
pub struct McpRegistry {
    servers: RwLock<HashMap<String, MCPServerConfig>>,
}

impl McpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the registry file path: `MCP_SERVERS_CONFIG` env override
    /// first, then the three standard filenames in the current directory.
    pub fn resolve_path(cwd: &Path) -> Result<PathBuf, RegistryError> {
        if let Ok(p) = std::env::var(ENV_OVERRIDE) {
            return Ok(PathBuf::from(p));
        }
        for name in DEFAULT_FILENAMES {
            let candidate = cwd.join(name);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(RegistryError::NotFound(ENV_OVERRIDE))
    }

    /// Loads servers from an explicit path, replacing the current contents.
    /// A malformed overall file raises; an individual malformed entry is
    /// skipped with a warning.
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RegistryError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let root: Value = if is_json {
            serde_json::from_str(&text).map_err(|e| RegistryError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str(&text).map_err(|e| RegistryError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        };
        self.load_from_value(root)
    }

    /// Loads servers from an already-parsed root value. Root key is
    /// `servers` or `mcpServers`, either accepted.
    pub fn load_from_value(&self, root: Value) -> Result<(), RegistryError> {
        let entries = root
            .get("servers")
            .or_else(|| root.get("mcpServers"))
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));
        let Value::Object(map) = entries else {
            return Err(RegistryError::Parse {
                path: "<value>".into(),
                message: "`servers`/`mcpServers` must be an object".into(),
            });
        };

        let mut loaded = HashMap::new();
        for (id, raw) in map {
            match normalize_entry(&id, raw) {
                Ok(cfg) => match cfg.validate() {
                    Ok(()) => {
                        loaded.insert(id, cfg);
                    }
                    Err(msg) => tracing::warn!(server_id = %id, error = %msg, "skipping invalid MCP server entry"),
                },
                Err(msg) => tracing::warn!(server_id = %id, error = %msg, "skipping invalid MCP server entry"),
            }
        }
        *self.servers.write().expect("registry lock poisoned") = loaded;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<MCPServerConfig> {
        self.servers.read().expect("registry lock poisoned").get(id).cloned()
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.servers.read().expect("registry lock poisoned").keys().cloned().collect()
    }

    pub fn reset(&self) {
        self.servers.write().expect("registry lock poisoned").clear();
    }
}

/// Expands a shorthand `{command, args, env}` entry to the canonical stdio
/// form, infers `sse` transport when `url` is present without an explicit
/// `transport`, and resolves `${VAR}` references in `command`/`env` against
/// the process environment. An unresolved reference is left as the literal
/// text rather than raising. Auth env-var names are never resolved here.
fn normalize_entry(id: &str, mut raw: Value) -> Result<MCPServerConfig, String> {
    let obj = raw.as_object_mut().ok_or_else(|| "entry must be an object".to_string())?;

    if !obj.contains_key("transport") {
        let implied = if obj.contains_key("url") { "sse" } else { "stdio" };
        obj.insert("transport".into(), Value::String(implied.into()));
    }
    obj.entry("id").or_insert_with(|| Value::String(id.to_string()));

    if let Some(Value::Array(args)) = obj.get_mut("args") {
        for arg in args.iter_mut() {
            if let Value::String(s) = arg {
                *s = resolve_env_placeholders(s);
            }
        }
    }
    if let Some(Value::String(cmd)) = obj.get_mut("command") {
        *cmd = resolve_env_placeholders(cmd);
    }
    if let Some(Value::Object(env)) = obj.get_mut("env") {
        for (_, v) in env.iter_mut() {
            if let Value::String(s) = v {
                *s = resolve_env_placeholders(s);
            }
        }
    }

    serde_json::from_value(raw).map_err(|e| e.to_string())
}

/// Resolves `${VAR}` occurrences against the process environment. A var that
/// is unset is left as the literal `${VAR}` text rather than raising.
fn resolve_env_placeholders(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var_name = &after[..end];
                match std::env::var(var_name) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => out.push_str(&format!("${{{}}}", var_name)),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str("${");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::Transport;
    use serde_json::json;

    #[test]
    fn resolves_env_var_when_set() {
        std::env::set_var("AGENTSHIP_TEST_TOKEN", "secret-123");
        let resolved = resolve_env_placeholders("Bearer ${AGENTSHIP_TEST_TOKEN}");
        assert_eq!(resolved, "Bearer secret-123");
        std::env::remove_var("AGENTSHIP_TEST_TOKEN");
    }

    #[test]
    fn leaves_unset_var_literal() {
        std::env::remove_var("AGENTSHIP_TEST_UNSET_XYZ");
        let resolved = resolve_env_placeholders("${AGENTSHIP_TEST_UNSET_XYZ}");
        assert_eq!(resolved, "${AGENTSHIP_TEST_UNSET_XYZ}");
    }

    #[test]
    fn shorthand_command_entry_expands_to_stdio() {
        let registry = McpRegistry::new();
        registry
            .load_from_value(json!({
                "servers": {
                    "filesystem": { "command": "npx", "args": ["-y", "mcp-fs"] }
                }
            }))
            .unwrap();
        let cfg = registry.get("filesystem").unwrap();
        assert_eq!(cfg.transport, Transport::Stdio);
        assert_eq!(cfg.command.as_deref(), Some("npx"));
    }

    #[test]
    fn url_without_transport_implies_sse() {
        let registry = McpRegistry::new();
        registry
            .load_from_value(json!({
                "mcpServers": {
                    "remote": { "url": "https://example.com/mcp" }
                }
            }))
            .unwrap();
        let cfg = registry.get("remote").unwrap();
        assert_eq!(cfg.transport, Transport::Sse);
    }

    #[test]
    fn invalid_entry_is_skipped_not_fatal() {
        let registry = McpRegistry::new();
        registry
            .load_from_value(json!({
                "servers": {
                    "good": { "command": "npx", "args": [] },
                    "bad_stdio_no_command": { "transport": "stdio" },
                    "bad_http_no_url": { "transport": "http" }
                }
            }))
            .unwrap();
        let mut ids = registry.list_ids();
        ids.sort();
        assert_eq!(ids, vec!["good".to_string()]);
    }

    #[test]
    fn auth_client_id_env_preserved_as_literal_name_never_resolved() {
        std::env::set_var("MY_CLIENT_ID", "should-not-be-substituted");
        let registry = McpRegistry::new();
        registry
            .load_from_value(json!({
                "servers": {
                    "oauth_server": {
                        "url": "https://example.com/mcp",
                        "auth": { "type": "oauth", "client_id_env": "MY_CLIENT_ID" }
                    }
                }
            }))
            .unwrap();
        let cfg = registry.get("oauth_server").unwrap();
        assert_eq!(cfg.auth.client_id_env.as_deref(), Some("MY_CLIENT_ID"));
        std::env::remove_var("MY_CLIENT_ID");
    }

    #[test]
    fn load_from_path_accepts_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("mcp_servers.json");
        std::fs::write(
            &json_path,
            r#"{"servers":{"a":{"command":"echo","args":[]}}}"#,
        )
        .unwrap();
        let registry = McpRegistry::new();
        registry.load_from_path(&json_path).unwrap();
        assert_eq!(registry.list_ids(), vec!["a".to_string()]);

        let yaml_path = dir.path().join("mcp_servers.yaml");
        std::fs::write(&yaml_path, "servers:\n  b:\n    command: echo\n").unwrap();
        let registry2 = McpRegistry::new();
        registry2.load_from_path(&yaml_path).unwrap();
        assert_eq!(registry2.list_ids(), vec!["b".to_string()]);
    }

    #[test]
    fn reset_clears_registry() {
        let registry = McpRegistry::new();
        registry
            .load_from_value(json!({"servers": {"a": {"command": "echo"}}}))
            .unwrap();
        registry.reset();
        assert!(registry.list_ids().is_empty());
    }
}
