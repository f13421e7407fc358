//! Function tools.
//!
//! A tool can name its implementation by an `import` string rather than a
//! dynamically-loaded callable. Rust has no dynamic import, so the idiomatic
//! analogue is a process-wide registry of `Arc<dyn Fn>` closures keyed by
//! that same string — callers register their native functions once at
//! startup, and `ToolDeclaration::Function` resolves against that registry
//! instead of touching the filesystem.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolSourceError;

use super::r#trait::{Tool, ToolCallContext, ToolParameter, ToolSpec};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A native Rust function registered under a name.
pub type NativeFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, ToolSourceError>> + Send + Sync>;

#[derive(Clone)]
struct RegisteredFunction {
    func: NativeFn,
    description: String,
    input_schema: Value,
    parameters: Vec<ToolParameter>,
}

/// Process-wide registry of native functions, looked up by the
/// `ToolDeclaration::Function::import` string.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: Arc<RwLock<HashMap<String, RegisteredFunction>>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        import: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ToolParameter>,
        input_schema: Value,
        func: NativeFn,
    ) {
        self.functions.write().expect("function registry lock poisoned").insert(
            import.into(),
            RegisteredFunction {
                func,
                description: description.into(),
                input_schema,
                parameters,
            },
        );
    }

    pub fn build(&self, id: &str, import: &str) -> Result<FunctionTool, ToolSourceError> {
        let entry = self
            .functions
            .read()
            .expect("function registry lock poisoned")
            .get(import)
            .cloned()
            .ok_or_else(|| ToolSourceError::NotFound(format!("function tool `{import}` is not registered")))?;
        Ok(FunctionTool {
            spec: ToolSpec {
                name: id.to_string(),
                description: entry.description,
                input_schema: entry.input_schema,
                parameters: entry.parameters,
                is_agent_tool: false,
            },
            func: entry.func,
        })
    }
}

/// A function tool bound to its native implementation.
pub struct FunctionTool {
    spec: ToolSpec,
    func: NativeFn,
}

#[async_trait]
impl Tool for FunctionTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn call(&self, arguments: Value, _ctx: &ToolCallContext) -> Result<Value, ToolSourceError> {
        (self.func)(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ToolCallContext {
        ToolCallContext {
            user_id: "u1".into(),
            session_id: "s1".into(),
        }
    }

    #[tokio::test]
    async fn registered_function_is_callable_by_import_name() {
        let registry = FunctionRegistry::new();
        registry.register(
            "math.add",
            "Adds two numbers",
            vec![
                ToolParameter { name: "a".into(), type_name: "number".into(), required: true, description: None },
                ToolParameter { name: "b".into(), type_name: "number".into(), required: true, description: None },
            ],
            json!({"type": "object", "properties": {"a": {"type": "number"}, "b": {"type": "number"}}}),
            Arc::new(|args: Value| {
                Box::pin(async move {
                    let a = args["a"].as_f64().unwrap_or(0.0);
                    let b = args["b"].as_f64().unwrap_or(0.0);
                    Ok(json!(a + b))
                }) as BoxFuture<'static, Result<Value, ToolSourceError>>
            }),
        );

        let tool = registry.build("add", "math.add").unwrap();
        let result = tool.call(json!({"a": 2, "b": 3}), &ctx()).await.unwrap();
        assert_eq!(result, json!(5.0));
    }

    #[test]
    fn unregistered_import_is_not_found() {
        let registry = FunctionRegistry::new();
        assert!(registry.build("x", "nope.missing").is_err());
    }
}
