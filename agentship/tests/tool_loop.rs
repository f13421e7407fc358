//! Integration test: a round-trip through the native engine's tool loop —
//! the model calls a registered function tool, observes its result, and
//! answers on the next round.


use std::sync::Arc;

use agentship::error::ToolSourceError;
use agentship::llm::MockLlm;
use agentship::tools::{BoxFuture, FunctionRegistry, Tool};
use agentship::{Engine, MemorySaver, NativeEngine, NativeSessionStore, NoopObserver, ProtocolEvent, RunInput};
use serde_json::{json, Value};
use tokio_stream::StreamExt;

fn get_time_registry() -> FunctionRegistry {
    let registry = FunctionRegistry::new();
    registry.register(
        "clock.now",
        "Returns the current time",
        vec![],
        json!({"type": "object", "properties": {}}),
        Arc::new(|_args: Value| {
            Box::pin(async { Ok(json!("2026-07-29T00:00:00Z")) }) as BoxFuture<'static, Result<Value, ToolSourceError>>
        }),
    );
    registry
}

#[tokio::test]
async fn run_calls_tool_then_answers_with_its_result() {
    let registry = get_time_registry();
    let tool: Arc<dyn Tool> = Arc::new(registry.build("get_time", "clock.now").unwrap());

    let llm = Arc::new(MockLlm::first_tool_then_answer("get_time", json!({}), "It's 2026-07-29T00:00:00Z."));
    let engine = NativeEngine::new(
        "clock-agent",
        "mock",
        "mock-model",
        0.2,
        "Answer questions about the time using the get_time tool.",
        10,
        vec![tool],
        llm,
        Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new()))),
        Arc::new(NoopObserver),
    );

    let output = engine.run("u1", "s1", RunInput::new("What time is it?")).await.unwrap();
    assert_eq!(output, json!("It's 2026-07-29T00:00:00Z."));
}

#[tokio::test]
async fn run_stream_emits_tool_call_then_tool_result_then_content() {
    let registry = get_time_registry();
    let tool: Arc<dyn Tool> = Arc::new(registry.build("get_time", "clock.now").unwrap());

    let llm = Arc::new(MockLlm::first_tool_then_answer("get_time", json!({}), "It's 2026-07-29T00:00:00Z."));
    let engine = NativeEngine::new(
        "clock-agent",
        "mock",
        "mock-model",
        0.2,
        "Answer questions about the time using the get_time tool.",
        10,
        vec![tool],
        llm,
        Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new()))),
        Arc::new(NoopObserver),
    );

    let mut stream = engine.run_stream("u1", "s1", RunInput::new("What time is it?")).await;
    let mut events = Vec::new();
    while let Some(ev) = stream.next().await {
        events.push(ev);
    }
    let tool_call_idx = events.iter().position(|e| matches!(e, ProtocolEvent::ToolCall { .. })).unwrap();
    let tool_result_idx = events.iter().position(|e| matches!(e, ProtocolEvent::ToolResult { .. })).unwrap();
    assert!(tool_call_idx < tool_result_idx);
    assert!(matches!(events.last(), Some(ProtocolEvent::Done { .. })));
}
