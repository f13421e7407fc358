//! # AgentShip
//!
//! The agent execution runtime: given an [`config::AgentConfig`], drive one or more
//! turns of LLM inference, optionally invoking tools (local functions, sub-agents, or
//! remote MCP servers), and produce either a single structured response or a live
//! stream of [`stream_event::ProtocolEvent`]s.
//!
//! ## Layers
//!
//! - [`config`]: [`config::AgentConfig`], [`config::ToolDeclaration`], [`config::AgentRegistry`]
//!   — load and validate agent configuration; discover agent classes by name.
//! - [`mcp`]: [`mcp::McpRegistry`] (server definitions file), [`mcp::StdioMcpClient`] /
//!   [`mcp::HttpMcpClient`] (transports), [`mcp::McpClientManager`] (owner-keyed client cache).
//! - [`tools`]: [`tools::ToolManager`] translates a [`config::ToolDeclaration`] into an
//!   engine-native [`tools::Tool`]; [`tools::PromptBuilder`] renders the generated
//!   "## Available Tools" section.
//! - [`session`]: [`session::SessionStore`] trait with [`session::NativeSessionStore`]
//!   (checkpoint-backed) and [`session::OrchestratedSessionStore`] (framework-native)
//!   implementations.
//! - [`memory`]: [`memory::Checkpointer`] trait with [`memory::MemorySaver`],
//!   [`memory::SqliteSaver`], and (behind the `postgres` feature) `PostgresSaver`.
//! - [`engine`]: the [`engine::Engine`] trait with [`engine::NativeEngine`] (the tool-loop
//!   state machine) and [`engine::OrchestratedEngine`] implementations, wrapped by
//!   [`engine::MiddlewareEngine`].
//! - [`llm`]: [`llm::LlmClient`] trait, [`llm::MockLlm`] (scripted rounds for tests),
//!   [`llm::OpenAiLlm`].
//! - [`observability`]: the [`observability::Observer`] callback contract and the
//!   context-local parent-trace stack.
//! - [`message`], [`error`]: shared [`message::Message`] history type and the error
//!   taxonomy each layer maps into.
//! - [`facade`]: [`facade::Agent`] adapts [`facade::AgentChatRequest`] /
//!   [`facade::AgentChatResponse`] onto a built [`engine::Engine`] — the boundary an
//!   HTTP/SSE transport or the agent-as-tool adapter calls through.
//!
//! ## Bootstrapping
//!
//! Applications embedding this crate should call [`bootstrap::init_env`] once at
//! startup, before reading any of the crate's environment variables
//! (`MCP_SERVERS_CONFIG`, `AGENT_SESSION_STORE_URI`, `AGENT_SHORT_TERM_MEMORY`,
//! `MCP_TOKEN_ENCRYPTION_KEY`, `MCP_DEFAULT_USER_ID`) so that `.env` / XDG-toml
//! values participate in the env > .env > XDG precedence (see `agentship-config`).
//!
//! The HTTP/SSE transport, the OAuth onboarding CLI, filesystem discovery of agent
//! YAML modules, and tracing export are external collaborators this crate does not
//! implement; it exposes narrow interfaces for them to consume ([`config::AgentRegistry`],
//! [`stream_event::ProtocolEvent`], [`observability::Observer`]).

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod facade;
pub mod llm;
pub mod mcp;
pub mod memory;
pub mod message;
pub mod observability;
pub mod session;
pub mod tools;

pub use config::{AgentConfig, AgentRegistry, ConfigError, EngineKind, ToolDeclaration};
pub use engine::{
    Engine, EngineCapabilities, EventStream, MiddlewareEngine, NativeEngine, OrchestratedEngine,
    RunInput,
};
pub use error::AgentError;
pub use facade::{Agent, AgentChatRequest, AgentChatResponse};
pub use llm::{LlmClient, LlmRequest, LlmTurnResult, MockLlm, OpenAiLlm};
pub use mcp::{HttpMcpClient, McpClient, McpClientManager, McpRegistry, StdioMcpClient};
pub use memory::{Checkpoint, Checkpointer, MemorySaver, SqliteSaver};
pub use message::Message;
pub use observability::{NoopObserver, Observer};
pub use session::{NativeSessionStore, OrchestratedSessionStore, SessionStore};
pub use stream_event::ProtocolEvent;
pub use tools::{AgentTool, FunctionTool, McpToolAdapter, PromptBuilder, Tool, ToolManager};
