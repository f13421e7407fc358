//! Provider/model limit table and allow-list validation.
//!
//! `AgentConfig` (in `agentship`) must reject a `(provider, model)` pair that
//! is not in the provider's allowed set. This crate
//! owns that table independently of the engine so it can be swapped or
//! extended without touching the engine crate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token limit specification for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Context (input) token limit.
    pub context_limit: u32,
    /// Output token limit.
    pub output_limit: u32,
}

impl ModelSpec {
    pub fn new(context_limit: u32, output_limit: u32) -> Self {
        Self {
            context_limit,
            output_limit,
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelSpecError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("model {model} is not in the allowed set for provider {provider}")]
    ModelNotAllowed { provider: String, model: String },
}

/// A static, caller-overridable table of `provider -> { model -> ModelSpec }`.
///
/// Rather than resolving limits by querying an external catalog over HTTP
/// with a cache/refresher pair, this table is populated at construction time
/// from a literal or a caller-supplied override, since a live external
/// service dependency has no place in the core runtime's allow-list check.
#[derive(Debug, Clone, Default)]
pub struct ModelTable {
    providers: HashMap<String, HashMap<String, ModelSpec>>,
}

impl ModelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table AgentShip ships with: one widely-used model per provider
    /// family, enough to validate configs and size prompts in tests without
    /// a network call.
    pub fn with_builtin_defaults() -> Self {
        let mut table = Self::new();
        table.register("openai", "gpt-4o", ModelSpec::new(128_000, 16_384));
        table.register("openai", "gpt-4o-mini", ModelSpec::new(128_000, 16_384));
        table.register("anthropic", "claude-3-5-sonnet", ModelSpec::new(200_000, 8_192));
        table.register("anthropic", "claude-3-haiku", ModelSpec::new(200_000, 4_096));
        table.register("mock", "mock-model", ModelSpec::new(32_000, 4_096));
        table
    }

    pub fn register(&mut self, provider: impl Into<String>, model: impl Into<String>, spec: ModelSpec) {
        self.providers
            .entry(provider.into())
            .or_default()
            .insert(model.into(), spec);
    }

    pub fn get(&self, provider: &str, model: &str) -> Option<&ModelSpec> {
        self.providers.get(provider)?.get(model)
    }

    /// Validates that `model` is in `provider`'s allowed set.
    pub fn validate(&self, provider: &str, model: &str) -> Result<&ModelSpec, ModelSpecError> {
        let models = self
            .providers
            .get(provider)
            .ok_or_else(|| ModelSpecError::UnknownProvider(provider.to_string()))?;
        models
            .get(model)
            .ok_or_else(|| ModelSpecError::ModelNotAllowed {
                provider: provider.to_string(),
                model: model.to_string(),
            })
    }
}
