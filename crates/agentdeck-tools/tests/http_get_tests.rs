//! `http_get` against a local mock server

use agentdeck_tools::{ToolError, ToolRegistry};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_http_get_returns_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("all good"))
        .expect(1)
        .mount(&server)
        .await;

    let registry = ToolRegistry::with_standard_tools();
    let output = registry
        .execute_tool(
            "http_get",
            json!({"url": format!("{}/status", server.uri())}),
            None,
        )
        .await
        .unwrap();

    assert_eq!(output, json!({"status": 200, "body": "all good", "success": true}));
}

#[tokio::test]
async fn test_http_get_reports_error_status_as_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let output = ToolRegistry::with_standard_tools()
        .execute_tool("http_get", json!({"url": server.uri()}), None)
        .await
        .unwrap();

    assert_eq!(output["status"], 503);
    assert_eq!(output["success"], false);
}

#[tokio::test]
async fn test_http_get_applies_configured_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer agent-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = ToolRegistry::with_standard_tools()
        .execute_tool(
            "http_get",
            json!({"url": server.uri()}),
            Some(json!({"headers": {"authorization": "Bearer agent-token"}})),
        )
        .await
        .unwrap();

    assert_eq!(output["success"], true);
}

#[tokio::test]
async fn test_http_get_timeout_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = ToolRegistry::with_standard_tools()
        .execute_tool(
            "http_get",
            json!({"url": server.uri()}),
            Some(json!({"timeoutSecs": 1})),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::ExecutionFailed { ref message, .. } if message.starts_with("Timeout")));
}

#[tokio::test]
async fn test_http_get_requires_url() {
    let err = ToolRegistry::with_standard_tools()
        .execute_tool("http_get", json!({}), None)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ToolError::MissingField {
            tool: "http_get".into(),
            field: "url".into()
        }
    );
}
