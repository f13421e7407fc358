//! Integration test: a tool-call argument that echoes back a schema
//! placeholder instead of a real user id is rewritten to the turn's actual
//! user id before both the emitted `tool_call` event and the tool
//! invocation itself.


use std::sync::Arc;

use agentship::error::ToolSourceError;
use agentship::llm::MockLlm;
use agentship::tools::{Tool, ToolCallContext, ToolParameter, ToolSpec};
use agentship::{Engine, MemorySaver, NativeEngine, NativeSessionStore, NoopObserver, ProtocolEvent, RunInput};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_stream::StreamExt;

struct RecordingTool {
    spec: ToolSpec,
    seen: std::sync::Mutex<Vec<Value>>,
}

#[async_trait]
impl Tool for RecordingTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }
    async fn call(&self, arguments: Value, _ctx: &ToolCallContext) -> Result<Value, ToolSourceError> {
        self.seen.lock().unwrap().push(arguments);
        Ok(json!("ok"))
    }
}

#[tokio::test]
async fn real_user_id_replaces_placeholder_before_tool_call_and_invocation() {
    let real_user_id = "3f8c1e2a-4b5d-4c6e-9f0a-1b2c3d4e5f6a";

    let tool = Arc::new(RecordingTool {
        spec: ToolSpec {
            name: "get_user".into(),
            description: "Looks up a user".into(),
            input_schema: json!({"type": "object"}),
            parameters: vec![ToolParameter { name: "user_id".into(), type_name: "string".into(), required: true, description: None }],
            is_agent_tool: false,
        },
        seen: std::sync::Mutex::new(Vec::new()),
    });

    let llm = Arc::new(MockLlm::first_tool_then_answer("get_user", json!({"user_id": "<user_id>"}), "done"));
    let engine = NativeEngine::new(
        "profile-agent",
        "mock",
        "mock-model",
        0.2,
        "Look up the current user's profile.",
        10,
        vec![tool.clone() as Arc<dyn Tool>],
        llm,
        Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new()))),
        Arc::new(NoopObserver),
    );

    let mut stream = engine.run_stream(real_user_id, "s1", RunInput::new("who am i")).await;
    let mut saw_real_id_in_event = false;
    while let Some(ev) = stream.next().await {
        if let ProtocolEvent::ToolCall { arguments, .. } = ev {
            if arguments["user_id"] == real_user_id {
                saw_real_id_in_event = true;
            }
        }
    }
    assert!(saw_real_id_in_event);

    let seen = tool.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["user_id"], real_user_id);
}
