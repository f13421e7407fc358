//! Wraps one remote MCP tool as a `Tool`.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolSourceError;
use crate::mcp::McpClient;

use super::r#trait::{Tool, ToolCallContext, ToolParameter, ToolSpec};

pub struct McpToolAdapter {
    spec: ToolSpec,
    client: std::sync::Arc<dyn McpClient>,
    remote_name: String,
}

impl McpToolAdapter {
    pub fn new(
        local_id: impl Into<String>,
        remote_name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        client: std::sync::Arc<dyn McpClient>,
    ) -> Self {
        let parameters = parameters_from_schema(&input_schema);
        Self {
            spec: ToolSpec {
                name: local_id.into(),
                description: description.into(),
                input_schema,
                parameters,
                is_agent_tool: false,
            },
            client,
            remote_name: remote_name.into(),
        }
    }
}

/// Converts a JSON-Schema `object` into the flat parameter list the prompt
/// builder renders, converting the MCP tool's JSON-Schema into the same
/// parameter shape every other tool kind exposes.
fn parameters_from_schema(schema: &Value) -> Vec<ToolParameter> {
    let Some(properties) = schema.get("properties").and_then(|v| v.as_object()) else {
        return Vec::new();
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, prop)| ToolParameter {
            name: name.clone(),
            type_name: prop.get("type").and_then(|v| v.as_str()).unwrap_or("any").to_string(),
            required: required.contains(&name.as_str()),
            description: prop.get("description").and_then(|v| v.as_str()).map(String::from),
        })
        .collect()
}

#[async_trait]
impl Tool for McpToolAdapter {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    /// Serializes kwargs to JSON, passing `{}` for empty arguments — never
    /// `null`. Transport/JSON-RPC errors are turned into descriptive strings
    /// and returned to the LLM rather than propagated.
    async fn call(&self, arguments: Value, _ctx: &ToolCallContext) -> Result<Value, ToolSourceError> {
        let arguments = if arguments.is_null() { serde_json::json!({}) } else { arguments };
        match self.client.call_tool(&self.remote_name, arguments).await {
            Ok(result) => Ok(result),
            Err(e) => Ok(Value::String(format!("Error calling MCP tool {}: {e}", self.remote_name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parameters_from_schema_marks_required_and_type() {
        let schema = json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "search text"},
                "limit": {"type": "integer"}
            },
            "required": ["query"]
        });
        let params = parameters_from_schema(&schema);
        let query = params.iter().find(|p| p.name == "query").unwrap();
        assert!(query.required);
        assert_eq!(query.type_name, "string");
        let limit = params.iter().find(|p| p.name == "limit").unwrap();
        assert!(!limit.required);
    }

    #[test]
    fn schema_without_properties_yields_no_parameters() {
        assert!(parameters_from_schema(&json!({"type": "object"})).is_empty());
    }
}
