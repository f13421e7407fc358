//! C5 — Tool Manager & Prompt Builder.

mod agent_tool;
mod function_tool;
mod manager;
mod mcp_tool;
mod prompt_builder;
#[path = "trait.rs"]
mod r#trait;

pub use agent_tool::AgentTool;
pub use function_tool::{BoxFuture, FunctionRegistry, FunctionTool, NativeFn};
pub use manager::{EngineTag, ToolManager};
pub use mcp_tool::McpToolAdapter;
pub use prompt_builder::PromptBuilder;
pub use r#trait::{Tool, ToolCallContext, ToolParameter, ToolSpec};
