//! C1 — Config & Registry: `AgentConfig`, `ToolDeclaration`, and the
//! in-process agent registry.

mod loader;

pub use loader::{load_agent_config, load_agent_configs_dir, LoaderError};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Which engine implementation executes an agent's turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Native,
    Orchestrated,
}

/// Where session/checkpoint state for an agent is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    Memory,
    Sqlite,
    Postgres,
    /// The orchestrating framework's own session service.
    VertexAi,
}

/// Which observability provider (if any) an agent reports to. The core only
/// needs the selector; the concrete provider plugin is injected by the
/// caller and consumed via the `Observer` trait.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservabilityProvider {
    #[default]
    None,
    Named(String),
}

/// One MCP server reference within an `AgentConfig`, with optional per-agent
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerRef {
    pub id: String,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl McpServerRef {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tools: None,
            env: HashMap::new(),
            timeout_secs: None,
        }
    }
}

/// Declaration of one tool an agent may call.
///
/// A tagged union, not a runtime-polymorphic base class: the
/// `type` field selects the variant, the same `#[serde(tag = ...)]`
/// convention used elsewhere in this workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDeclaration {
    Function {
        id: String,
        import: String,
        #[serde(default)]
        method: Option<String>,
        #[serde(default)]
        input_schema_class: Option<String>,
    },
    Agent {
        id: String,
        agent_class: String,
    },
    McpRef {
        id: String,
        server_id: String,
        #[serde(default)]
        allow: Option<Vec<String>>,
    },
}

impl ToolDeclaration {
    pub fn id(&self) -> &str {
        match self {
            Self::Function { id, .. } | Self::Agent { id, .. } | Self::McpRef { id, .. } => id,
        }
    }
}

/// An agent's immutable, loaded configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub provider: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub engine: EngineKind,
    #[serde(default)]
    pub instruction_template: String,
    #[serde(default)]
    pub tools: Vec<ToolDeclaration>,
    #[serde(default)]
    pub mcp_servers: Vec<McpServerRef>,
    #[serde(default = "default_session_backend")]
    pub session_backend: SessionBackend,
    #[serde(default)]
    pub observability: ObservabilityProvider,
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_session_backend() -> SessionBackend {
    SessionBackend::Memory
}

fn default_max_tool_rounds() -> u32 {
    10
}

/// Errors validating an `AgentConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("model {model} is not allowed for provider {provider}")]
    ModelNotAllowed { provider: String, model: String },
    #[error("VertexAI session backend requires the orchestrated engine")]
    VertexAiRequiresOrchestrated,
}

impl AgentConfig {
    /// Validates the two invariants from: the model must be in the
    /// provider's allowed set (checked against the caller-supplied table, so
    /// this crate does not hardcode a provider list), and a VertexAI session
    /// backend requires the orchestrated engine.
    pub fn validate(&self, models: &agentship_model_spec::ModelTable) -> Result<(), ConfigError> {
        models
            .validate(&self.provider, &self.model)
            .map_err(|_| ConfigError::ModelNotAllowed {
                provider: self.provider.clone(),
                model: self.model.clone(),
            })?;
        if self.session_backend == SessionBackend::VertexAi && self.engine != EngineKind::Orchestrated {
            return Err(ConfigError::VertexAiRequiresOrchestrated);
        }
        Ok(())
    }
}

/// Process-wide registry of loaded agent configs, keyed by name — a
/// singleton that lets one agent declare another as a sub-agent tool
/// purely by name, with a `reset` for tests.
#[derive(Default)]
pub struct AgentRegistry {
    configs: RwLock<HashMap<String, Arc<AgentConfig>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, config: AgentConfig) {
        self.configs
            .write()
            .expect("AgentRegistry lock poisoned")
            .insert(config.name.clone(), Arc::new(config));
    }

    pub fn get(&self, name: &str) -> Option<Arc<AgentConfig>> {
        self.configs
            .read()
            .expect("AgentRegistry lock poisoned")
            .get(name)
            .cloned()
    }

    pub fn list_names(&self) -> Vec<String> {
        self.configs
            .read()
            .expect("AgentRegistry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn reset(&self) {
        self.configs.write().expect("AgentRegistry lock poisoned").clear();
    }
}
