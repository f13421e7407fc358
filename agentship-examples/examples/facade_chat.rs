//! The `Agent` facade boundary:
//! `AgentChatRequest` in, `AgentChatResponse` out, with a leading `session`
//! event on the streaming path.
//!
//! Run: `cargo run -p agentship-examples --example facade_chat`

use std::sync::Arc;

use tokio_stream::StreamExt;

use agentship::llm::{MockLlm, ScriptedRound};
use agentship::{Agent, AgentChatRequest, MemorySaver, NativeEngine, NativeSessionStore, NoopObserver};
use stream_event::ProtocolEvent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let llm = Arc::new(MockLlm::new(vec![Ok(ScriptedRound::content("Hola"))]));
    let session_store = Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new())));
    let engine = Arc::new(NativeEngine::new(
        "translator",
        "mock",
        "mock-model",
        0.2,
        "Translate the user's text to Spanish.",
        10,
        vec![],
        llm,
        session_store,
        Arc::new(NoopObserver),
    ));
    let agent = Agent::new("translator", engine);

    let response = agent
        .chat(AgentChatRequest::text("translator", "demo-user", "demo-session", "Hello"))
        .await?;
    println!("chat: success={} response={}", response.success, response.content());

    let mut stream = agent
        .chat_stream(AgentChatRequest::text("translator", "demo-user", "demo-session-2", "Hello again"))
        .await;
    while let Some(event) = stream.next().await {
        match &event {
            ProtocolEvent::Session { session_id, .. } => println!("session {session_id}"),
            ProtocolEvent::Content { delta, .. } => print!("{delta}"),
            ProtocolEvent::Done { .. } => println!("\n[done]"),
            _ => {}
        }
    }

    Ok(())
}
