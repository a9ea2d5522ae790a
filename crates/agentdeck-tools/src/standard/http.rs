//! # HTTP Client Tools

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;

use super::parse_input;
use crate::tool::{ExecutionResult, FailureReason, Tool};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Deserialize)]
struct HttpGetInput {
    url: String,
    #[serde(default)]
    headers: HashMap<String, String>,
}

/// Per-agent settings from the tool association's config blob
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpGetConfig {
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    headers: HashMap<String, String>,
}

/// HTTP GET tool for retrieving resources
pub struct HttpGetTool {
    client: Client,
}

impl HttpGetTool {
    /// Longest wait a caller can configure for one request
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(MAX_TIMEOUT_SECS);

    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpGetTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HttpGetTool {
    fn name(&self) -> &str {
        "http_get"
    }

    fn description(&self) -> &str {
        "Fetch a URL over HTTP GET"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "format": "uri" },
                "headers": {
                    "type": "object",
                    "additionalProperties": { "type": "string" }
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, input: Value, config: Option<Value>) -> ExecutionResult {
        let input: HttpGetInput = match parse_input(input) {
            Ok(input) => input,
            Err(failure) => return failure,
        };
        let config: HttpGetConfig = match config {
            Some(config) if !config.is_null() => match parse_input(config) {
                Ok(config) => config,
                Err(failure) => return failure,
            },
            _ => HttpGetConfig::default(),
        };

        let url = match Url::parse(&input.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                return ExecutionResult::invalid_input(format!(
                    "unsupported URL scheme '{}'",
                    url.scheme()
                ));
            }
            Err(e) => return ExecutionResult::invalid_input(format!("invalid URL: {e}")),
        };

        let timeout_secs = config
            .timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, MAX_TIMEOUT_SECS);

        let mut request = self
            .client
            .get(url.clone())
            .timeout(Duration::from_secs(timeout_secs));

        // Call-level headers override configured ones
        for (key, value) in config.headers.iter().chain(input.headers.iter()) {
            request = request.header(key, value);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => ExecutionResult::success(json!({
                        "status": status,
                        "body": body,
                        "success": (200..300).contains(&status)
                    })),
                    Err(e) => ExecutionResult::failed(FailureReason::NetworkError {
                        message: format!("Failed to read response body: {e}"),
                    }),
                }
            }
            Err(e) if e.is_timeout() => ExecutionResult::failed(FailureReason::Timeout {
                operation: format!("GET {url}"),
            }),
            Err(e) => ExecutionResult::failed(FailureReason::NetworkError {
                message: format!("HTTP request failed: {e}"),
            }),
        }
    }
}
