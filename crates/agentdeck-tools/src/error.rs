//! Tool registry error types.

use thiserror::Error;

/// Errors returned by [`ToolRegistry::execute_tool`](crate::ToolRegistry::execute_tool)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Missing required field '{field}' for tool '{tool}'")]
    MissingField { tool: String, field: String },

    #[error("Invalid input for tool '{tool}': {message}")]
    InvalidInput { tool: String, message: String },

    #[error("Tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },
}

impl ToolError {
    /// Name of the tool the error refers to
    pub fn tool(&self) -> &str {
        match self {
            ToolError::NotFound { name } => name,
            ToolError::MissingField { tool, .. }
            | ToolError::InvalidInput { tool, .. }
            | ToolError::ExecutionFailed { tool, .. } => tool,
        }
    }

    /// Whether the caller supplied bad input rather than the tool failing
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ToolError::MissingField { .. } | ToolError::InvalidInput { .. }
        )
    }
}
