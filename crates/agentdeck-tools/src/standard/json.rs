//! JSON document queries.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::parse_input;
use crate::tool::{ExecutionResult, Tool};

#[derive(Debug, Deserialize)]
struct JsonQueryInput {
    /// A JSON value, or a string holding a JSON document
    document: Value,
    #[serde(default)]
    path: String,
}

/// Looks up a dot-separated path such as `items.0.name` in a JSON document
pub struct JsonQueryTool;

impl JsonQueryTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonQueryTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for JsonQueryTool {
    fn name(&self) -> &str {
        "json_query"
    }

    fn description(&self) -> &str {
        "Extract a value from a JSON document by dot path"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "document": {
                    "description": "JSON value or JSON-encoded string"
                },
                "path": {
                    "type": "string",
                    "description": "Dot path; array elements by index, empty for the root"
                }
            },
            "required": ["document"]
        })
    }

    async fn execute(&self, input: Value, _config: Option<Value>) -> ExecutionResult {
        let input: JsonQueryInput = match parse_input(input) {
            Ok(input) => input,
            Err(failure) => return failure,
        };

        let document = match input.document {
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(parsed) => parsed,
                Err(e) => return ExecutionResult::invalid_input(format!("Invalid JSON: {e}")),
            },
            other => other,
        };

        let value = lookup(&document, &input.path);
        ExecutionResult::success(json!({
            "path": input.path,
            "found": value.is_some(),
            "value": value.cloned().unwrap_or(Value::Null)
        }))
    }
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}
