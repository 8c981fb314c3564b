//! Tool registry and [`Tool`] trait definition.
//!
//! Defines the interface all tool implementations satisfy and a
//! [`ToolRegistry`] that stores registered tools and dispatches
//! execution requests by name, enforcing an optional per-stage
//! allowlist. Tool output is rendered markdown text; it flows into the
//! stage context verbatim.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

/// Error type for tool execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The requested tool was not found in the registry.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// The arguments provided to the tool are invalid.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// The tool execution failed at runtime.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The tool is registered but not granted to the invoking stage.
    ///
    /// `tool` is the denied tool, `role` the stage role that asked.
    #[error("tool '{tool}' is not available to the {role} stage")]
    NotGranted { tool: String, role: String },
}

/// A tool the pipeline stages can invoke.
///
/// Implementations provide a name, a description, and an async
/// `execute` taking a JSON argument object and returning rendered
/// markdown text.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// A human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// Execute with the given arguments, returning report text.
    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError>;
}

/// Registry of available tools, indexed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        debug!(tool = %name, "registering tool");
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All registered tool names, sorted alphabetically.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Execute a tool by name, enforcing the stage's capability set.
    ///
    /// `granted` is the allowlist of tool names the invoking stage
    /// holds; `role` only labels the error. Lookup failures fire before
    /// grant failures so a typo reads as "not found", not "denied".
    pub async fn execute(
        &self,
        name: &str,
        args: serde_json::Value,
        granted: &[String],
        role: &str,
    ) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        if !granted.iter().any(|g| g == name) {
            return Err(ToolError::NotGranted {
                tool: name.to_string(),
                role: role.to_string(),
            });
        }
        debug!(tool = %name, role = %role, "executing tool");
        tool.execute(args).await
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo back the 'text' argument"
        }

        async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
            let text = args
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidArgs("missing 'text'".into()))?;
            Ok(text.to_string())
        }
    }

    fn registry() -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        reg
    }

    #[tokio::test]
    async fn dispatches_by_name() {
        let reg = registry();
        let out = reg
            .execute(
                "echo",
                serde_json::json!({"text": "hi"}),
                &["echo".to_string()],
                "auditor",
            )
            .await
            .unwrap();
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let reg = registry();
        let err = reg
            .execute("missing", serde_json::json!({}), &["missing".to_string()], "auditor")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn ungranted_tool_is_denied() {
        let reg = registry();
        let err = reg
            .execute("echo", serde_json::json!({}), &[], "financier")
            .await
            .unwrap_err();
        match err {
            ToolError::NotGranted { tool, role } => {
                assert_eq!(tool, "echo");
                assert_eq!(role, "financier");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn invalid_args_surface() {
        let reg = registry();
        let err = reg
            .execute("echo", serde_json::json!({}), &["echo".to_string()], "auditor")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }

    #[test]
    fn list_is_sorted() {
        let mut reg = registry();

        struct OtherTool;
        #[async_trait]
        impl Tool for OtherTool {
            fn name(&self) -> &str {
                "analyze"
            }
            fn description(&self) -> &str {
                "noop"
            }
            async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
                Ok(String::new())
            }
        }
        reg.register(Arc::new(OtherTool));
        assert_eq!(reg.list(), vec!["analyze".to_string(), "echo".to_string()]);
        assert!(reg.contains("echo"));
        assert_eq!(reg.len(), 2);
    }
}
