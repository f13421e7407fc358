//! `ToolManager::create_tools`: visits each `ToolDeclaration`
//! in an `AgentConfig` and produces the matching `Tool` impl.

use std::sync::Arc;

use crate::config::{AgentConfig, ToolDeclaration};
use crate::error::{RegistryError, ToolSourceError};
use crate::mcp::{McpClientManager, McpRegistry};

use super::agent_tool::AgentTool;
use super::function_tool::FunctionRegistry;
use super::mcp_tool::McpToolAdapter;
use super::r#trait::Tool;

/// Which engine the tools are being built for. Both native and orchestrated
/// consume the same `Tool` trait in this crate (collapses the
/// two engine-native wrapper shapes from into one Rust trait,
/// since both the Function and MCP branches end up producing the same
/// "structured tool with a JSON-Schema" shape that async-openai expects
/// either way); kept as an enum for forward compatibility and because
/// prompt rendering differs subtly per engine tag in the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTag {
    Native,
    Orchestrated,
}

pub struct ToolManager {
    functions: FunctionRegistry,
    mcp_registry: Arc<McpRegistry>,
    mcp_manager: Arc<McpClientManager>,
}

impl ToolManager {
    pub fn new(functions: FunctionRegistry, mcp_registry: Arc<McpRegistry>, mcp_manager: Arc<McpClientManager>) -> Self {
        Self {
            functions,
            mcp_registry,
            mcp_manager,
        }
    }

    /// Resolves every `ToolDeclaration` on `config` into a ready-to-call
    /// `Tool`. `owner_id` scopes MCP clients and nested agent sessions.
    pub async fn create_tools(
        &self,
        config: &AgentConfig,
        owner_id: &str,
        sub_agents: &std::collections::HashMap<String, Arc<crate::facade::Agent>>,
        _engine: EngineTag,
    ) -> Result<Vec<Arc<dyn Tool>>, ToolSourceError> {
        let mut tools: Vec<Arc<dyn Tool>> = Vec::new();

        for decl in &config.tools {
            match decl {
                ToolDeclaration::Function { id, import, .. } => {
                    tools.push(Arc::new(self.functions.build(id, import)?));
                }
                ToolDeclaration::Agent { id, agent_class } => {
                    let sub_agent = sub_agents.get(agent_class).cloned().ok_or_else(|| {
                        ToolSourceError::NotFound(format!("sub-agent `{agent_class}` not registered"))
                    })?;
                    let description = format!("Delegates a task to the `{agent_class}` agent");
                    tools.push(Arc::new(AgentTool::new(id.clone(), description, sub_agent)));
                }
                ToolDeclaration::McpRef { id, server_id, allow } => {
                    let server_config = self
                        .mcp_registry
                        .get(server_id)
                        .ok_or_else(|| ToolSourceError::from(RegistryError::UnknownServer(server_id.clone())))?;
                    let client = self
                        .mcp_manager
                        .get(&server_config, owner_id)
                        .await
                        .map_err(ToolSourceError::from)?;
                    let remote_tools = client.list_tools().await.map_err(ToolSourceError::from)?;
                    for remote in remote_tools {
                        if let Some(allow) = allow {
                            if !allow.contains(&remote.name) {
                                continue;
                            }
                        }
                        let local_id = format!("{id}__{}", remote.name);
                        tools.push(Arc::new(McpToolAdapter::new(
                            local_id,
                            remote.name.clone(),
                            remote.description.clone().unwrap_or_default(),
                            remote.input_schema.clone(),
                            client.clone(),
                        )));
                    }
                }
            }
        }

        Ok(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineKind, McpServerRef, ObservabilityProvider, SessionBackend};
    use serde_json::json;

    fn base_config() -> AgentConfig {
        AgentConfig {
            name: "t".into(),
            description: String::new(),
            provider: "mock".into(),
            model: "mock-model".into(),
            temperature: 0.2,
            engine: EngineKind::Native,
            instruction_template: String::new(),
            tools: vec![],
            mcp_servers: vec![],
            session_backend: SessionBackend::Memory,
            observability: ObservabilityProvider::None,
            max_tool_rounds: 10,
        }
    }

    #[tokio::test]
    async fn create_tools_resolves_function_declaration() {
        let functions = FunctionRegistry::new();
        functions.register(
            "noop.echo",
            "Echoes input",
            vec![],
            json!({"type": "object"}),
            std::sync::Arc::new(|v| Box::pin(async move { Ok(v) })),
        );
        let mcp_registry = Arc::new(McpRegistry::new());
        let mcp_manager = Arc::new(McpClientManager::new(None));
        let manager = ToolManager::new(functions, mcp_registry, mcp_manager);

        let mut config = base_config();
        config.tools.push(ToolDeclaration::Function {
            id: "echo".into(),
            import: "noop.echo".into(),
            method: None,
            input_schema_class: None,
        });

        let tools = manager
            .create_tools(&config, "owner-1", &Default::default(), EngineTag::Native)
            .await
            .unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].spec().name, "echo");
    }

    #[tokio::test]
    async fn create_tools_rejects_unknown_mcp_server() {
        let functions = FunctionRegistry::new();
        let mcp_registry = Arc::new(McpRegistry::new());
        let mcp_manager = Arc::new(McpClientManager::new(None));
        let manager = ToolManager::new(functions, mcp_registry, mcp_manager);

        let mut config = base_config();
        config.mcp_servers.push(McpServerRef::by_id("nonexistent"));
        config.tools.push(ToolDeclaration::McpRef {
            id: "db".into(),
            server_id: "nonexistent".into(),
            allow: None,
        });

        let err = manager
            .create_tools(&config, "owner-1", &Default::default(), EngineTag::Native)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolSourceError::NotFound(_)));
    }
}
