//! Core tool abstractions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Categorized failure reasons for tool execution.
///
/// Structured instead of plain strings so the registry can tell bad input
/// apart from a tool that broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    /// Invalid or malformed input provided to the tool
    InvalidInput { message: String },
    /// Required resource not found
    NotFound { resource: String },
    /// Network-related failure
    NetworkError { message: String },
    /// Timeout exceeded
    Timeout { operation: String },
    /// Internal tool error or unexpected state
    InternalError { message: String },
}

impl FailureReason {
    /// Get a human-readable error message
    pub fn message(&self) -> String {
        match self {
            FailureReason::InvalidInput { message } => format!("Invalid input: {}", message),
            FailureReason::NotFound { resource } => format!("Not found: {}", resource),
            FailureReason::NetworkError { message } => format!("Network error: {}", message),
            FailureReason::Timeout { operation } => format!("Timeout: {}", operation),
            FailureReason::InternalError { message } => format!("Internal error: {}", message),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// The result of executing a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Tool executed successfully with a JSON output
    Success { output: Value },
    /// Tool execution failed with a structured reason
    Failure { reason: FailureReason },
}

impl ExecutionResult {
    pub fn success(output: Value) -> Self {
        ExecutionResult::Success { output }
    }

    pub fn failed(reason: FailureReason) -> Self {
        ExecutionResult::Failure { reason }
    }

    /// Failure wrapped in [`FailureReason::InternalError`].
    pub fn failure(message: impl Into<String>) -> Self {
        Self::failed(FailureReason::InternalError {
            message: message.into(),
        })
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::failed(FailureReason::InvalidInput {
            message: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failure { .. })
    }

    /// Get the failure reason if the execution failed.
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            ExecutionResult::Failure { reason } => Some(reason),
            ExecutionResult::Success { .. } => None,
        }
    }
}

/// A named capability an agent can use.
///
/// Tools are looked up by [`name`](Tool::name) in a
/// [`ToolRegistry`](crate::ToolRegistry). Input is a JSON object whose shape
/// is described by [`input_schema`](Tool::input_schema); fields listed in
/// its `required` array are checked by the registry before `execute` runs.
///
/// # Example
///
/// ```rust
/// use agentdeck_tools::{ExecutionResult, Tool};
/// use async_trait::async_trait;
/// use serde_json::{Value, json};
///
/// struct EchoTool;
///
/// #[async_trait]
/// impl Tool for EchoTool {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     async fn execute(&self, input: Value, _config: Option<Value>) -> ExecutionResult {
///         ExecutionResult::success(json!({ "echo": input }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// JSON schema of the input object.
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// Run the tool.
    ///
    /// `config` is the per-agent configuration blob of the tool
    /// association, when the call is made on behalf of an agent.
    async fn execute(&self, input: Value, config: Option<Value>) -> ExecutionResult;
}

/// Public description of a registered tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
        }
    }

    /// Names listed in the schema's `required` array.
    pub fn required_fields(&self) -> Vec<&str> {
        required_fields(&self.input_schema)
    }
}

pub(crate) fn required_fields(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|fields| fields.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_serialization() {
        let reason = FailureReason::Timeout {
            operation: "GET https://example.com".into(),
        };
        assert_eq!(
            serde_json::to_value(&reason).unwrap(),
            json!({"type": "timeout", "operation": "GET https://example.com"})
        );
        assert_eq!(reason.to_string(), "Timeout: GET https://example.com");
    }

    #[test]
    fn test_execution_result_helpers() {
        let ok = ExecutionResult::success(json!(1));
        assert!(ok.is_success());
        assert!(ok.failure_reason().is_none());

        let err = ExecutionResult::invalid_input("missing text");
        assert!(err.is_failure());
        assert_eq!(
            err.failure_reason(),
            Some(&FailureReason::InvalidInput {
                message: "missing text".into()
            })
        );
    }

    #[test]
    fn test_required_fields() {
        let schema = json!({"type": "object", "required": ["a", "b"]});
        assert_eq!(required_fields(&schema), vec!["a", "b"]);
        assert!(required_fields(&json!({})).is_empty());
    }
}
