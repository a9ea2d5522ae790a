//! Text analysis.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::parse_input;
use crate::tool::{ExecutionResult, Tool};

#[derive(Debug, Deserialize)]
struct TextInput {
    text: String,
}

/// Text statistics tool
pub struct TextAnalyzeTool;

impl TextAnalyzeTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextAnalyzeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for TextAnalyzeTool {
    fn name(&self) -> &str {
        "text_analyze"
    }

    fn description(&self) -> &str {
        "Count words, characters, lines and sentences in a text"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string" }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, input: Value, _config: Option<Value>) -> ExecutionResult {
        let TextInput { text } = match parse_input(input) {
            Ok(input) => input,
            Err(failure) => return failure,
        };

        let sentence_count = text
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count();

        ExecutionResult::success(json!({
            "character_count": text.chars().count(),
            "byte_count": text.len(),
            "word_count": text.split_whitespace().count(),
            "line_count": text.lines().count(),
            "sentence_count": sentence_count,
            "is_empty": text.is_empty(),
            "is_ascii": text.is_ascii()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_analyze() {
        let result = TextAnalyzeTool::new()
            .execute(json!({"text": "Hello world. How are you?\nFine!"}), None)
            .await;

        let ExecutionResult::Success { output } = result else {
            panic!("expected success");
        };
        assert_eq!(output["word_count"], 6);
        assert_eq!(output["line_count"], 2);
        assert_eq!(output["sentence_count"], 3);
        assert_eq!(output["is_ascii"], true);
    }

    #[tokio::test]
    async fn test_text_analyze_counts_chars_not_bytes() {
        let result = TextAnalyzeTool::new()
            .execute(json!({"text": "héllo"}), None)
            .await;

        let ExecutionResult::Success { output } = result else {
            panic!("expected success");
        };
        assert_eq!(output["character_count"], 5);
        assert_eq!(output["byte_count"], 6);
    }

    #[tokio::test]
    async fn test_text_must_be_string() {
        let result = TextAnalyzeTool::new().execute(json!({"text": 5}), None).await;
        assert!(result.is_failure());
    }
}
