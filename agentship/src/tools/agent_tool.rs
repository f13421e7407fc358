//! Sub-agent-as-tool adapter.
//!
//! `AgentTool` wraps a sub-agent and adapts its facade's `chat` call into
//! `Tool::call`: it constructs an inner `AgentChatRequest`, propagates
//! `user_id`, and addresses the sub-agent with a session id scoped to it
//! rather than reusing the parent's.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolSourceError;
use crate::facade::{Agent, AgentChatRequest};

use super::r#trait::{Tool, ToolCallContext, ToolParameter, ToolSpec};

/// Wraps a sub-agent so the outer engine can call it exactly like any other
/// tool. `is_agent_tool=true` lets observability distinguish it.
pub struct AgentTool {
    spec: ToolSpec,
    sub_agent: std::sync::Arc<Agent>,
}

impl AgentTool {
    pub fn new(id: impl Into<String>, description: impl Into<String>, sub_agent: std::sync::Arc<Agent>) -> Self {
        Self {
            spec: ToolSpec {
                name: id.into(),
                description: description.into(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": { "task": { "type": "string" } },
                    "required": ["task"],
                }),
                parameters: vec![ToolParameter {
                    name: "task".into(),
                    type_name: "string".into(),
                    required: true,
                    description: Some("The task to delegate to the sub-agent".into()),
                }],
                is_agent_tool: true,
            },
            sub_agent,
        }
    }

    /// Builds the synthetic sub-session id: scoped to this tool and the
    /// parent session, so the sub-agent's own checkpointed history never
    /// collides with a sibling call from the same parent turn.
    fn sub_session_id(&self, parent_session_id: &str) -> String {
        format!("{parent_session_id}::agent-tool::{}", self.spec.name)
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn call(&self, arguments: Value, ctx: &ToolCallContext) -> Result<Value, ToolSourceError> {
        let task = arguments
            .get("task")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidInput("agent tool requires a `task` string".into()))?
            .to_string();

        let request = AgentChatRequest::text(
            self.sub_agent.name(),
            ctx.user_id.clone(),
            self.sub_session_id(&ctx.session_id),
            task,
        );
        let response = self
            .sub_agent
            .chat(request)
            .await
            .map_err(|e| ToolSourceError::SubAgent(e.to_string()))?;
        if !response.success {
            return Err(ToolSourceError::SubAgent(response.content()));
        }
        Ok(Value::String(response.content()))
    }
}
