//! Integration test: a parent agent delegates a sub-task to another agent
//! wrapped as a tool. The sub-agent's plain-prose reply becomes the tool's
//! result, addressed under a session id scoped away from the parent's own.


use std::sync::Arc;

use agentship::llm::{MockLlm, ScriptedRound};
use agentship::tools::Tool;
use agentship::{Agent, AgentTool, Engine, MemorySaver, NativeEngine, NativeSessionStore, NoopObserver, RunInput};
use serde_json::json;

fn summarizer_agent(reply: &str) -> Arc<Agent> {
    let llm = Arc::new(MockLlm::new(vec![Ok(ScriptedRound::content(reply))]));
    let engine: Arc<dyn Engine> = Arc::new(NativeEngine::new(
        "summarizer",
        "mock",
        "mock-model",
        0.2,
        "Summarize the given text.",
        10,
        vec![],
        llm,
        Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new()))),
        Arc::new(NoopObserver),
    ));
    Arc::new(Agent::new("summarizer", engine))
}

#[tokio::test]
async fn parent_agent_delegates_to_sub_agent_via_agent_tool() {
    let sub_agent = summarizer_agent("A short summary.");
    let agent_tool: Arc<dyn Tool> = Arc::new(AgentTool::new("summarize", "Delegates to the summarizer agent", sub_agent));

    let llm = Arc::new(MockLlm::first_tool_then_answer(
        "summarize",
        json!({"task": "the quarterly report"}),
        "A short summary.",
    ));
    let parent = NativeEngine::new(
        "report-agent",
        "mock",
        "mock-model",
        0.2,
        "Delegate long documents to the summarizer.",
        10,
        vec![agent_tool],
        llm,
        Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new()))),
        Arc::new(NoopObserver),
    );

    let output = parent.run("u1", "parent-session", RunInput::new("Summarize the quarterly report")).await.unwrap();
    assert_eq!(output, json!("A short summary."));
}
