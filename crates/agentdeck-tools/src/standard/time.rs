use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use super::parse_input;
use crate::tool::{ExecutionResult, Tool};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentTimeInput {
    /// Offset from UTC in minutes, e.g. 120 for UTC+2
    #[serde(default)]
    utc_offset_minutes: Option<i32>,
}

/// Reports the current time
pub struct CurrentTimeTool;

impl CurrentTimeTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Current date and time, in UTC or at a fixed offset"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "utcOffsetMinutes": { "type": "integer", "minimum": -1439, "maximum": 1439 }
            },
            "required": []
        })
    }

    async fn execute(&self, input: Value, _config: Option<Value>) -> ExecutionResult {
        let input: CurrentTimeInput = if input.is_null() {
            CurrentTimeInput::default()
        } else {
            match parse_input(input) {
                Ok(input) => input,
                Err(failure) => return failure,
            }
        };

        let now = Utc::now();
        let minutes = input.utc_offset_minutes.unwrap_or(0);
        let Some(offset) = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
        else {
            return ExecutionResult::invalid_input(format!(
                "offset out of range: {minutes} minutes"
            ));
        };

        ExecutionResult::success(json!({
            "utc": now.to_rfc3339(),
            "local": now.with_timezone(&offset).to_rfc3339(),
            "unixSeconds": now.timestamp(),
            "utcOffsetMinutes": minutes
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_current_time_with_offset() {
        let result = CurrentTimeTool::new()
            .execute(json!({"utcOffsetMinutes": 120}), None)
            .await;
        let ExecutionResult::Success { output } = result else {
            panic!("expected success");
        };
        assert!(output["local"].as_str().unwrap().ends_with("+02:00"));
        assert!(output["unixSeconds"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_current_time_without_input() {
        let result = CurrentTimeTool::new().execute(Value::Null, None).await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_offset_out_of_range() {
        let result = CurrentTimeTool::new()
            .execute(json!({"utcOffsetMinutes": 5000}), None)
            .await;
        assert!(result.is_failure());
    }
}
