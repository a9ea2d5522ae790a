//! Tool registry: name lookup, input checks and isolated execution.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::standard::{CalculatorTool, CurrentTimeTool, HttpGetTool, JsonQueryTool, TextAnalyzeTool};
use crate::tool::{ExecutionResult, FailureReason, Tool, ToolDescriptor, required_fields};

/// Registry of tools keyed by name.
///
/// Built once at startup and shared read-only. Each execution runs on its
/// own tokio task, so a tool that panics fails that call only.
///
/// # Example
///
/// ```rust
/// use agentdeck_tools::ToolRegistry;
///
/// let registry = ToolRegistry::with_standard_tools();
/// assert!(registry.get_tool("calculator").is_some());
/// ```
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard tool library
    pub fn with_standard_tools() -> Self {
        Self::new()
            .with_tool(Arc::new(CalculatorTool::new()))
            .with_tool(Arc::new(TextAnalyzeTool::new()))
            .with_tool(Arc::new(JsonQueryTool::new()))
            .with_tool(Arc::new(HttpGetTool::new()))
            .with_tool(Arc::new(CurrentTimeTool::new()))
    }

    /// Add a tool under its own name. A tool with the same name is replaced.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replacing registered tool");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get_tool(&self, name: &str) -> Option<ToolDescriptor> {
        self.tools.get(name).map(|tool| ToolDescriptor::of(tool.as_ref()))
    }

    /// Descriptors of every registered tool, sorted by name
    pub fn get_all_tools(&self) -> Vec<ToolDescriptor> {
        let mut tools: Vec<ToolDescriptor> = self
            .tools
            .values()
            .map(|tool| ToolDescriptor::of(tool.as_ref()))
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Execute a tool by name.
    ///
    /// Fields listed as required by the tool's schema must be present and
    /// non-null in `input`. A `Failure` result is returned as an error:
    /// input failures as [`ToolError::InvalidInput`], everything else as
    /// [`ToolError::ExecutionFailed`].
    pub async fn execute_tool(
        &self,
        name: &str,
        input: Value,
        config: Option<Value>,
    ) -> Result<Value, ToolError> {
        let tool = self.tools.get(name).cloned().ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
        })?;

        check_required(name, &tool.input_schema(), &input)?;

        debug!(tool = %name, "Executing tool");
        let started = Instant::now();

        let handle = tokio::spawn(async move { tool.execute(input, config).await });
        let result = match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    "tool panicked during execution".to_string()
                } else {
                    "tool execution was cancelled".to_string()
                };
                warn!(tool = %name, error = %join_error, "Tool task did not complete");
                return Err(ToolError::ExecutionFailed {
                    tool: name.to_string(),
                    message,
                });
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            ExecutionResult::Success { output } => {
                debug!(tool = %name, duration_ms, "Tool execution succeeded");
                Ok(output)
            }
            ExecutionResult::Failure { reason } => {
                warn!(tool = %name, duration_ms, reason = %reason, "Tool execution failed");
                Err(match reason {
                    FailureReason::InvalidInput { message } => ToolError::InvalidInput {
                        tool: name.to_string(),
                        message,
                    },
                    other => ToolError::ExecutionFailed {
                        tool: name.to_string(),
                        message: other.message(),
                    },
                })
            }
        }
    }
}

fn check_required(tool: &str, schema: &Value, input: &Value) -> Result<(), ToolError> {
    let required = required_fields(schema);
    if required.is_empty() {
        return Ok(());
    }

    let object = input.as_object().ok_or_else(|| ToolError::InvalidInput {
        tool: tool.to_string(),
        message: "input must be a JSON object".to_string(),
    })?;

    for field in required {
        if object.get(field).is_none_or(Value::is_null) {
            return Err(ToolError::MissingField {
                tool: tool.to_string(),
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        fn name(&self) -> &str {
            "boom"
        }

        async fn execute(&self, _input: Value, _config: Option<Value>) -> ExecutionResult {
            panic!("boom");
        }
    }

    struct ConfigEchoTool;

    #[async_trait]
    impl Tool for ConfigEchoTool {
        fn name(&self) -> &str {
            "config_echo"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "required": ["value"]})
        }

        async fn execute(&self, input: Value, config: Option<Value>) -> ExecutionResult {
            ExecutionResult::success(json!({"input": input["value"], "config": config}))
        }
    }

    #[test]
    fn test_standard_tools_sorted() {
        let registry = ToolRegistry::with_standard_tools();
        let names: Vec<String> = registry.get_all_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["calculator", "current_time", "http_get", "json_query", "text_analyze"]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.execute_tool("nope", json!({}), None).await.unwrap_err();
        assert_eq!(err, ToolError::NotFound { name: "nope".into() });
    }

    #[tokio::test]
    async fn test_missing_required_field() {
        let registry = ToolRegistry::new().with_tool(Arc::new(ConfigEchoTool));

        let err = registry
            .execute_tool("config_echo", json!({"value": null}), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::MissingField {
                tool: "config_echo".into(),
                field: "value".into()
            }
        );

        let err = registry
            .execute_tool("config_echo", json!("text"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_deeply_nested_expression_is_invalid_input() {
        let registry = ToolRegistry::with_standard_tools();
        let expression = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));

        let err = registry
            .execute_tool("calculator", json!({"expression": expression}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { ref tool, .. } if tool == "calculator"));
    }

    #[tokio::test]
    async fn test_config_is_passed_through() {
        let registry = ToolRegistry::new().with_tool(Arc::new(ConfigEchoTool));
        let output = registry
            .execute_tool("config_echo", json!({"value": 3}), Some(json!({"mode": "fast"})))
            .await
            .unwrap();
        assert_eq!(output, json!({"input": 3, "config": {"mode": "fast"}}));
    }

    #[tokio::test]
    async fn test_panicking_tool_is_isolated() {
        let registry = ToolRegistry::new()
            .with_tool(Arc::new(PanickingTool))
            .with_tool(Arc::new(ConfigEchoTool));

        let err = registry.execute_tool("boom", json!({}), None).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { ref tool, .. } if tool == "boom"));

        // The registry keeps serving other calls
        assert!(
            registry
                .execute_tool("config_echo", json!({"value": 1}), None)
                .await
                .is_ok()
        );
    }
}
