//! Translation agent, no tools.
//!
//! Runs the native engine's non-streaming `run` against a scripted LLM that
//! returns a JSON object matching the declared single-field-free output
//! schema, and prints the parsed response.
//!
//! Run: `cargo run -p agentship-examples --example translate`

use std::sync::Arc;

use agentship::engine::{Engine, OutputSchema, RunInput};
use agentship::llm::{MockLlm, ScriptedRound};
use agentship::{MemorySaver, NativeEngine, NativeSessionStore, NoopObserver};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let llm = Arc::new(MockLlm::new(vec![Ok(ScriptedRound::content(
        r#"{"translated_text":"Hola"}"#,
    ))]));
    let session_store = Arc::new(NativeSessionStore::with_checkpointer(Arc::new(MemorySaver::new())));

    let engine = NativeEngine::new(
        "translator",
        "mock",
        "mock-model",
        0.2,
        "Translate the user's text from the source language to the target language.",
        10,
        vec![],
        llm,
        session_store,
        Arc::new(NoopObserver),
    );

    let input = RunInput::new(r#"{"text":"Hello","from_language":"en","to_language":"es"}"#)
        .with_output_schema(OutputSchema::new(vec!["translated_text"]));

    let output = engine.run("demo-user", "demo-session", input).await?;
    println!("{output}");
    assert_eq!(output["translated_text"], "Hola");
    Ok(())
}
