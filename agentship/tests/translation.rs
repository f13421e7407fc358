//! Integration test: a no-tools run against a declared output schema, both
//! as a single `run` call and as a streamed turn ending in `done`.


use std::sync::Arc;

use agentship::llm::{MockLlm, ScriptedRound};
use agentship::{Engine, MemorySaver, NativeEngine, NativeSessionStore, NoopObserver, OutputSchema, ProtocolEvent, RunInput};
use tokio_stream::StreamExt;

fn translator(llm: Arc<dyn agentship::LlmClient>) -> NativeEngine {
    NativeEngine::new(
        "translator",
        "mock",
        "mock-model",
        0.2,
        "Translate the given text to Spanish.",
        10,
        vec![],
        llm,
        Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new()))),
        Arc::new(NoopObserver),
    )
}

#[tokio::test]
async fn run_parses_json_content_against_declared_schema() {
    let llm = Arc::new(MockLlm::new(vec![Ok(ScriptedRound::content(r#"{"translated_text":"Hola"}"#))]));
    let engine = translator(llm);
    let output = engine
        .run("u1", "s1", RunInput::new("Hello").with_output_schema(OutputSchema::new(vec!["translated_text"])))
        .await
        .unwrap();
    assert_eq!(output["translated_text"], "Hola");
}

#[tokio::test]
async fn run_stream_opens_with_thinking_and_ends_with_done() {
    let llm = Arc::new(MockLlm::new(vec![Ok(ScriptedRound::content("Hola"))]));
    let engine = translator(llm);
    let mut stream = engine.run_stream("u1", "s1", RunInput::new("Hello")).await;
    let mut events = Vec::new();
    while let Some(ev) = stream.next().await {
        events.push(ev);
    }
    assert!(matches!(events.first(), Some(ProtocolEvent::Thinking { .. })));
    assert!(matches!(events.last(), Some(ProtocolEvent::Done { .. })));
    assert!(events.iter().any(|e| matches!(e, ProtocolEvent::Content { .. })));
}
