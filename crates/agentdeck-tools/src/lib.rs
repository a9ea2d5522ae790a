//! # AgentDeck Tools
//!
//! Pluggable capabilities agents can be given, and the registry that looks
//! them up by name.
//!
//! ## Usage
//!
//! ```rust
//! use agentdeck_tools::ToolRegistry;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), agentdeck_tools::ToolError> {
//! let registry = ToolRegistry::with_standard_tools();
//! let output = registry
//!     .execute_tool("calculator", json!({"expression": "2 + 2"}), None)
//!     .await?;
//! assert_eq!(output["result"], 4.0);
//! # Ok(())
//! # }
//! ```

/// Tool registry error type.
pub mod error;
/// Name-keyed registry with isolated execution.
pub mod registry;
/// Standard tool library.
pub mod standard;
/// Core tool trait and result types.
pub mod tool;

pub use error::ToolError;
pub use registry::ToolRegistry;
pub use standard::*;
pub use tool::{ExecutionResult, FailureReason, Tool, ToolDescriptor};
