//! HTTP router configuration
//!
//! This module registers every route of the dashboard API and installs the
//! middleware stack.

use agentdeck_tools::HttpGetTool;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::runtime::{
    config::ServerConfig,
    error::{panic_response, request_id_middleware},
    handlers::{
        attach_tool, cancel_execution, create_agent, create_execution, delegate_task,
        delete_agent, detach_tool, execute_tool, get_agent, get_agent_tasks, get_execution,
        get_task, get_tool, health_check, invoke_agent_stream, list_agent_tools, list_agents,
        list_executions, list_tools, mark_started, prepare_agent, stream_execution,
        update_agent, update_agent_tool,
    },
    state::AppState,
};

/// Headroom above the slowest tool for reading the body and rendering
const TOOL_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Create the Axum router with all endpoints and middleware
///
/// The request timeout bounds the time to the response head; event streams
/// are bounded by their own maximum lifetime instead. Tool runs get a
/// budget large enough for the slowest standard tool.
pub fn router(state: AppState) -> Router {
    mark_started();
    let config = state.config.clone();

    let agent_routes = Router::new()
        .route("/agents", get(list_agents).post(create_agent))
        .route(
            "/agents/{agent_id}",
            get(get_agent).patch(update_agent).delete(delete_agent),
        )
        .route("/agents/{agent_id}/prepare", post(prepare_agent))
        .route("/agents/{agent_id}/invoke-stream", post(invoke_agent_stream))
        .route("/agents/{agent_id}/tasks", get(get_agent_tasks))
        .route(
            "/agents/{agent_id}/tools",
            get(list_agent_tools).post(attach_tool),
        )
        .route(
            "/agents/{agent_id}/tools/{tool_id}",
            axum::routing::put(update_agent_tool).delete(detach_tool),
        );

    let execution_routes = Router::new()
        .route("/executions", get(list_executions).post(create_execution))
        .route("/executions/{execution_id}", get(get_execution))
        .route("/executions/{execution_id}/cancel", post(cancel_execution))
        .route("/executions/{execution_id}/stream", get(stream_execution));

    let task_routes = Router::new()
        .route("/tasks/delegate", post(delegate_task))
        .route("/tasks/{task_id}", get(get_task));

    let tool_routes = Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/{name}", get(get_tool).post(execute_tool));

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .merge(agent_routes)
        .merge(execution_routes)
        .merge(task_routes);

    let routes = with_timeout(api_routes, config.request_timeout())
        .merge(with_timeout(tool_routes, tool_timeout(&config)))
        .with_state(state);

    with_middleware(routes, &config)
}

/// Budget for tool routes: the request timeout, raised to cover `http_get`
/// waiting out its longest allowed timeout.
fn tool_timeout(config: &ServerConfig) -> Duration {
    config
        .request_timeout()
        .max(HttpGetTool::MAX_TIMEOUT + TOOL_TIMEOUT_MARGIN)
}

/// Answer `408 Request Timeout` when `routes` take longer than `timeout`
/// to produce a response head.
fn with_timeout<S>(routes: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes.layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        timeout,
    ))
}

/// Layers shared by every route
///
/// A panicking handler becomes a sanitized `500` under the request's id
/// instead of a dropped connection.
fn with_middleware(routes: Router, config: &ServerConfig) -> Router {
    let mut router = routes
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http());

    // Add CORS if enabled
    if config.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}
