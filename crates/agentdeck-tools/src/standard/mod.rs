//! # Standard Tool Library
//!
//! Tools every AgentDeck deployment registers by default.
//!
//! | Tool | Purpose |
//! |------|---------|
//! | `calculator` | Evaluate an arithmetic expression |
//! | `text_analyze` | Word, character and line counts |
//! | `json_query` | Dot-path lookup into a JSON document |
//! | `http_get` | Fetch a URL |
//! | `current_time` | Current time, optionally at a fixed UTC offset |

mod http;
mod json;
mod math;
mod text;
mod time;

pub use http::HttpGetTool;
pub use json::JsonQueryTool;
pub use math::CalculatorTool;
pub use text::TextAnalyzeTool;
pub use time::CurrentTimeTool;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::tool::ExecutionResult;

/// Deserialize a tool's input object, mapping failures to invalid input.
pub(crate) fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, ExecutionResult> {
    serde_json::from_value(input).map_err(|e| ExecutionResult::invalid_input(e.to_string()))
}
