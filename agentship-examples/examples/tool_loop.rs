//! Function tool driven through the streaming tool loop: one `tool_call` /
//! `tool_result` pair before the final answer.
//!
//! Run: `cargo run -p agentship-examples --example tool_loop`

use std::sync::Arc;

use serde_json::json;
use tokio_stream::StreamExt;

use agentship::engine::RunInput;
use agentship::llm::MockLlm;
use agentship::tools::{BoxFuture, FunctionRegistry};
use agentship::{Engine, MemorySaver, NativeEngine, NativeSessionStore, NoopObserver, Tool};
use stream_event::ProtocolEvent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = FunctionRegistry::new();
    registry.register(
        "db.list_tables",
        "Lists the tables in the connected database",
        vec![],
        json!({"type": "object", "properties": {}}),
        Arc::new(|_args| {
            Box::pin(async { Ok(json!(["users", "orders"])) }) as BoxFuture<'static, _>
        }),
    );
    let list_tables: Arc<dyn Tool> = Arc::new(registry.build("list_tables", "db.list_tables")?);

    let llm = Arc::new(MockLlm::first_tool_then_answer(
        "list_tables",
        json!({}),
        "Tables: users, orders",
    ));
    let session_store = Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new())));

    let engine = NativeEngine::new(
        "db-assistant",
        "mock",
        "mock-model",
        0.2,
        "Answer questions about the connected database using the available tools.",
        10,
        vec![list_tables],
        llm,
        session_store,
        Arc::new(NoopObserver),
    );

    let mut stream = engine.run_stream("demo-user", "demo-session", RunInput::new("List all tables")).await;
    while let Some(event) = stream.next().await {
        match &event {
            ProtocolEvent::ToolCall { tool_name, arguments, .. } => {
                println!("tool_call  {tool_name}({arguments})")
            }
            ProtocolEvent::ToolResult { tool_name, result, .. } => {
                println!("tool_result {tool_name} -> {result}")
            }
            ProtocolEvent::Content { delta, .. } => print!("{delta}"),
            ProtocolEvent::Done { .. } => println!("\n[done]"),
            _ => {}
        }
    }

    Ok(())
}
