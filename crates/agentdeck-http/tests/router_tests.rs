//! Router tests for a runtime without a remote gateway
//!
//! Agents are managed locally and streams run in simulated mode.

use agentdeck_http::{AppState, EXECUTION_ID_HEADER, ServerConfigBuilder, router};
use agentdeck_tools::{ExecutionResult, Tool, ToolRegistry};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn create_test_app() -> Router {
    create_app_with(ServerConfigBuilder::new().simulation_tick_ms(10))
}

fn create_app_with(builder: ServerConfigBuilder) -> Router {
    let config = builder.build().expect("valid test config");
    router(AppState::with_parts(
        config,
        None,
        ToolRegistry::with_standard_tools(),
    ))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Read an SSE body to its end and decode every `data:` frame.
async fn read_events(response: axum::response::Response) -> Vec<Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec())
        .unwrap()
        .split("\n\n")
        .filter_map(|frame| {
            frame
                .lines()
                .find_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
                .map(|data| serde_json::from_str(data).unwrap())
        })
        .collect()
}

async fn create_bot(app: &Router) -> Value {
    let (status, json) = send(
        app,
        json_request(
            "POST",
            "/agents",
            json!({
                "agentName": "Bot",
                "instructions": "help",
                "foundationModel": "amazon.titan-text-lite-v1"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["agent"].clone()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();
    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "agentdeck");
    assert!(json["timestamp"].is_string());
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["remoteGateway"].is_null());
    assert_eq!(json["counts"]["agents"], 0);
    assert_eq!(json["counts"]["tools"], 5);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "dash-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "dash-42");

    // Unsafe ids are replaced
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "bad id!")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_ne!(response.headers()["x-request-id"], "bad id!");
}

#[tokio::test]
async fn test_create_agent_without_gateway() {
    let app = create_test_app();
    let agent = create_bot(&app).await;

    let id = agent["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(agent["agentStatus"], "PREPARED");
    assert_eq!(agent["idleSessionTtlInSeconds"], 600);
    assert!(agent.get("agentId").is_none());

    let (status, json) = send(&app, get(&format!("/agents/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agent"]["agentName"], "Bot");
}

#[tokio::test]
async fn test_identical_submissions_get_distinct_ids() {
    let app = create_test_app();
    let first = create_bot(&app).await;
    let second = create_bot(&app).await;
    assert_ne!(first["id"], second["id"]);

    let (_, json) = send(&app, get("/agents")).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["agents"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_agent_validation() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/agents",
            json!({"agentName": "Bot", "foundationModel": "m"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "missing_required_field");
    assert_eq!(json["details"]["field"], "instructions");
    assert!(json["requestId"].is_string());

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/agents",
            json!({"agentName": "  ", "instructions": "help", "foundationModel": "m"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");
    assert_eq!(json["details"]["field"], "agentName");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = create_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/agents")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_json");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = create_app_with(ServerConfigBuilder::new().max_body_size(64));
    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/agents",
            json!({
                "agentName": "Bot",
                "instructions": "x".repeat(200),
                "foundationModel": "m"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"], "payload_too_large");
}

#[tokio::test]
async fn test_update_agent() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/agents/{id}"),
            json!({"description": "Answers questions", "isFavorite": true, "tags": ["support"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agent"]["description"], "Answers questions");
    assert_eq!(json["agent"]["isFavorite"], true);
    assert_eq!(json["agent"]["tags"], json!(["support"]));
    assert_eq!(json["agent"]["agentName"], "Bot");

    let (status, _) = send(
        &app,
        json_request("PATCH", "/agents/missing", json!({"description": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_agent() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/agents/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, json) = send(&app, get(&format!("/agents/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["message"], "Agent not found.");

    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/agents/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_prepare_requires_remote_identity() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        json_request("POST", &format!("/agents/{id}/prepare"), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");
}

#[tokio::test]
async fn test_tool_association_lifecycle() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();
    let tools_uri = format!("/agents/{id}/tools");

    let (status, json) = send(
        &app,
        json_request("POST", &tools_uri, json!({"toolId": "calculator", "priority": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agentTool"]["toolId"], "calculator");
    assert_eq!(json["agentTool"]["enabled"], true);

    // Same pair twice
    let (status, json) = send(
        &app,
        json_request("POST", &tools_uri, json!({"toolId": "calculator"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "duplicate_association");

    let (status, json) = send(
        &app,
        json_request(
            "PUT",
            &format!("{tools_uri}/calculator"),
            json!({"enabled": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agentTool"]["enabled"], false);

    let (_, json) = send(&app, get(&tools_uri)).await;
    assert_eq!(json["tools"].as_array().unwrap().len(), 1);

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(format!("{tools_uri}/calculator"))
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Detach then re-attach succeeds
    let (status, _) = send(
        &app,
        json_request("POST", &tools_uri, json!({"toolId": "calculator"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_attach_tool_errors() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let tools_uri = format!("/agents/{}/tools", agent["id"].as_str().unwrap());

    let (status, json) = send(&app, json_request("POST", &tools_uri, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "missing_required_field");

    let (status, json) = send(&app, json_request("POST", &tools_uri, json!({"toolId": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"]["field"], "toolId");

    let (status, _) = send(
        &app,
        json_request("POST", &tools_uri, json!({"toolId": "teleport"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request("POST", "/agents/missing/tools", json!({"toolId": "calculator"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_agent_detaches_tools() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();
    send(
        &app,
        json_request("POST", &format!("/agents/{id}/tools"), json!({"toolId": "text_analyze"})),
    )
    .await;

    send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/agents/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/tools/text_analyze",
            json!({"input": {"text": "hi"}, "agentId": id}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tool_registry_endpoints() {
    let app = create_test_app();

    let (status, json) = send(&app, get("/tools")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["calculator", "current_time", "http_get", "json_query", "text_analyze"]
    );

    let (status, json) = send(&app, get("/tools/calculator")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tool"]["inputSchema"]["required"], json!(["expression"]));

    let (status, _) = send(&app, get("/tools/teleport")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_execute_tool() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/tools/calculator",
            json!({"input": {"expression": "2 + 3 * 4"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tool"], "calculator");
    assert_eq!(json["result"]["result"], 14.0);

    let (status, json) = send(&app, json_request("POST", "/tools/calculator", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "missing_required_field");
    assert_eq!(json["details"]["field"], "expression");

    let (status, json) = send(
        &app,
        json_request("POST", "/tools/calculator", json!({"input": {"expression": "1 / 0"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");
}

#[tokio::test]
async fn test_execute_unknown_tool() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        json_request("POST", "/tools/teleport", json!({"input": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");

    // No body at all
    let request = Request::builder()
        .method("POST")
        .uri("/tools/teleport")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_execute_tool_for_agent_respects_association() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();
    let body = json!({"input": {"text": "Hello there."}, "agentId": id});

    let (status, _) = send(&app, json_request("POST", "/tools/text_analyze", body.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &app,
        json_request(
            "POST",
            &format!("/agents/{id}/tools"),
            json!({"toolId": "text_analyze", "enabled": false}),
        ),
    )
    .await;
    let (status, json) = send(
        &app,
        json_request("POST", "/tools/text_analyze", body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"]["field"], "agentId");

    send(
        &app,
        json_request(
            "PUT",
            &format!("/agents/{id}/tools/text_analyze"),
            json!({"enabled": true}),
        ),
    )
    .await;
    let (status, json) = send(&app, json_request("POST", "/tools/text_analyze", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"]["word_count"], 2);
}

#[tokio::test]
async fn test_delegate_task_creates_execution() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();

    let (status, receipt) = send(
        &app,
        json_request(
            "POST",
            "/tasks/delegate",
            json!({
                "agentId": id,
                "taskName": "Summarize",
                "description": "Summarize the report",
                "priority": "HIGH",
                "input": "report.pdf"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["accepted"], true);
    let task_id = receipt["taskId"].as_str().unwrap();
    let execution_id = receipt["executionId"].as_str().unwrap();

    let (status, json) = send(&app, get(&format!("/tasks/{task_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["task"]["status"], "PENDING");
    assert_eq!(json["task"]["priority"], "HIGH");
    assert_eq!(json["task"]["executionId"], execution_id);

    let (_, json) = send(&app, get(&format!("/executions/{execution_id}"))).await;
    assert_eq!(json["execution"]["status"], "RUNNING");
    assert_eq!(json["execution"]["tasks"].as_array().unwrap().len(), 1);

    // A second task on the same execution
    let (status, second) = send(
        &app,
        json_request(
            "POST",
            "/tasks/delegate",
            json!({"agentId": id, "name": "Review", "executionId": execution_id}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["executionId"], execution_id);

    let (status, json) = send(&app, get(&format!("/agents/{id}/tasks?limit=1"))).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = json["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["name"], "Review");
}

#[tokio::test]
async fn test_delegate_to_missing_agent_creates_nothing() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/tasks/delegate",
            json!({"agentId": "ghost", "taskName": "Summarize"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");

    let (_, json) = send(&app, get("/executions")).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_delegate_validation() {
    let app = create_test_app();
    let agent = create_bot(&app).await;

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/tasks/delegate",
            json!({"agentId": agent["id"], "taskName": ""}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/tasks/delegate",
            json!({"agentId": agent["id"], "taskName": "x", "executionId": "nope"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/tasks/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_listing_for_missing_agent() {
    let app = create_test_app();
    let (status, _) = send(&app, get("/agents/ghost/tasks")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_execution_lifecycle() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        json_request("POST", "/executions", json!({"agentId": id, "input": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let execution_id = json["execution"]["id"].as_str().unwrap().to_string();
    assert_eq!(json["execution"]["status"], "RUNNING");
    assert!(json["execution"]["sessionId"].is_string());

    let (_, json) = send(&app, get(&format!("/executions?agentId={id}"))).await;
    assert_eq!(json["total"], 1);
    let (_, json) = send(&app, get("/executions?agentId=other")).await;
    assert_eq!(json["total"], 0);

    let (_, json) = send(&app, get(&format!("/agents/{id}"))).await;
    assert_eq!(json["agent"]["executionCount"], 1);

    let cancel = format!("/executions/{execution_id}/cancel");
    let (status, json) = send(&app, json_request("POST", &cancel, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["execution"]["status"], "CANCELLED");
    assert!(json["execution"]["endTime"].is_string());

    let (status, json) = send(&app, json_request("POST", &cancel, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");
}

#[tokio::test]
async fn test_create_execution_for_missing_agent() {
    let app = create_test_app();
    let (status, _) = send(
        &app,
        json_request("POST", "/executions", json!({"agentId": "ghost", "input": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/executions/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stream_missing_execution_is_404() {
    let app = create_test_app();
    let response = app
        .oneshot(get("/executions/does-not-exist/stream"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_ne!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
}

#[tokio::test]
async fn test_invoke_stream_simulates_local_agent() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/agents/{id}/invoke-stream"),
            json!({"input": "Plan my week"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    let execution_id = response.headers()[EXECUTION_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();

    let events = read_events(response).await;
    assert_eq!(events.first().unwrap()["type"], "execution");
    assert_eq!(events.first().unwrap()["execution"]["id"], execution_id);

    let mut last_progress = 0;
    for event in &events[1..events.len() - 1] {
        assert_eq!(event["type"], "update");
        let progress = event["execution"]["tasks"][0]["progress"].as_u64().unwrap();
        assert!(progress >= last_progress && progress <= 100);
        last_progress = progress;
    }

    let last = events.last().unwrap();
    assert_eq!(last["type"], "complete");
    assert_eq!(last["execution"]["status"], "COMPLETE");

    let (_, json) = send(&app, get(&format!("/executions/{execution_id}"))).await;
    assert_eq!(json["execution"]["status"], "COMPLETE");
    assert_eq!(json["execution"]["tasks"][0]["name"], "Process input");
}

#[tokio::test]
async fn test_invoke_stream_errors() {
    let app = create_app_with(ServerConfigBuilder::new().simulation_enabled(false));
    let agent = create_bot(&app).await;
    let id = agent["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        json_request("POST", "/agents/ghost/invoke-stream", json!({"input": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(
        &app,
        json_request("POST", &format!("/agents/{id}/invoke-stream"), json!({"input": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"]["field"], "input");

    // Local agent with simulation off cannot be invoked
    let (status, _) = send(
        &app,
        json_request("POST", &format!("/agents/{id}/invoke-stream"), json!({"input": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = send(&app, get("/executions")).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_stream_terminal_execution() {
    let app = create_test_app();
    let agent = create_bot(&app).await;
    let (_, json) = send(
        &app,
        json_request(
            "POST",
            "/executions",
            json!({"agentId": agent["id"], "input": "hi"}),
        ),
    )
    .await;
    let execution_id = json["execution"]["id"].as_str().unwrap().to_string();
    send(
        &app,
        json_request("POST", &format!("/executions/{execution_id}/cancel"), json!({})),
    )
    .await;

    let response = app
        .oneshot(get(&format!("/executions/{execution_id}/stream")))
        .await
        .unwrap();
    let events = read_events(response).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["type"], "execution");
    assert_eq!(events[1]["type"], "complete");
    assert_eq!(events[1]["execution"]["status"], "CANCELLED");
}

#[tokio::test]
async fn test_stream_without_simulation_sends_snapshot() {
    let app = create_app_with(ServerConfigBuilder::new().simulation_enabled(false));
    let agent = create_bot(&app).await;
    let (_, json) = send(
        &app,
        json_request(
            "POST",
            "/executions",
            json!({"agentId": agent["id"], "input": "hi"}),
        ),
    )
    .await;
    let execution_id = json["execution"]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(&format!("/executions/{execution_id}/stream")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let events = read_events(response).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["execution"]["status"], "RUNNING");
}

/// Tool that answers after `delay`
struct SlowTool {
    delay: Duration,
}

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    async fn execute(&self, _input: Value, _config: Option<Value>) -> ExecutionResult {
        tokio::time::sleep(self.delay).await;
        ExecutionResult::success(json!({"done": true}))
    }
}

#[tokio::test(start_paused = true)]
async fn test_tool_runs_outlast_request_timeout() {
    let config = ServerConfigBuilder::new()
        .request_timeout_secs(1)
        .build()
        .expect("valid test config");
    let tools = ToolRegistry::with_standard_tools().with_tool(Arc::new(SlowTool {
        delay: Duration::from_secs(60),
    }));
    let app = router(AppState::with_parts(config, None, tools));

    let (status, json) = send(&app, json_request("POST", "/tools/slow", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"]["done"], true);
}
