//! Observability contract: callbacks an engine fires around model calls,
//! tool calls, and decisions, as before/after pairs bracketing each step.

use std::cell::RefCell;

use async_trait::async_trait;
use serde_json::Value;

/// What the engine decided after a model round: return the answer, or call
/// one or more tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentDecision {
    FinalResponse,
    CallTools(Vec<String>),
}

impl std::fmt::Display for AgentDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FinalResponse => write!(f, "final response"),
            Self::CallTools(names) => write!(f, "call tools: {}", names.join(", ")),
        }
    }
}

/// Eight well-defined callback points both engines invoke.
/// Every method defaults to a no-op; providers override only what they need.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn before_agent(&self, _agent: &str, _session_id: &str) {}
    async fn after_agent(&self, _agent: &str, _session_id: &str) {}
    async fn before_model(&self, _agent: &str) {}
    async fn after_model(&self, _agent: &str, _decision: &AgentDecision) {}
    async fn before_tool(&self, _agent: &str, _tool_name: &str, _input: &Value, _session_id: &str, _is_agent_tool: bool) {}
    async fn after_tool(&self, _agent: &str, _tool_name: &str, _result: &Result<Value, String>) {}
}

/// The default observer: every callback is a no-op.
#[derive(Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

tokio::task_local! {
    static PARENT_TRACE: RefCell<Vec<String>>;
}

/// Runs `fut` with `agent` pushed onto the context-local parent-trace stack,
/// so nested sub-agent calls get correctly nested spans without threading a
/// parameter through every call.
pub async fn with_agent_span<F>(agent: &str, fut: F) -> F::Output
where
    F: std::future::Future,
{
    let mut stack = current_trace();
    stack.push(agent.to_string());
    PARENT_TRACE.scope(RefCell::new(stack), fut).await
}

/// The full chain of agent names currently executing, outermost first.
pub fn current_trace() -> Vec<String> {
    PARENT_TRACE.try_with(|s| s.borrow().clone()).unwrap_or_default()
}

/// The immediate parent agent's name, if any (`None` at the outermost call).
pub fn parent_agent() -> Option<String> {
    let trace = current_trace();
    trace.len().checked_sub(2).map(|i| trace[i].clone())
}
