//! Tool registry HTTP handlers

use agentdeck_core::AgentTool;
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
};
use tracing::{debug, info, warn};

use crate::runtime::{
    error::{RequestId, RuntimeError, RuntimeResult},
    state::AppState,
    types::{ExecuteToolRequest, ToolExecutionResponse, ToolResponse, ToolsResponse},
};

/// GET /tools - Registered tools sorted by name
pub async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.tools.get_all_tools(),
    })
}

/// GET /tools/{name}
pub async fn get_tool(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(name): Path<String>,
) -> RuntimeResult<Json<ToolResponse>> {
    let tool = state
        .tools
        .get_tool(&name)
        .ok_or_else(|| RuntimeError::not_found("Tool", &name, request_id))?;
    Ok(Json(ToolResponse { tool }))
}

/// POST /tools/{name} - Run a tool directly
///
/// The tool is resolved before the body is read, so an unknown tool is a
/// 404 whatever the body. An empty body runs the tool with `{}`. When
/// `agentId` is given the agent's association must exist and be enabled,
/// and its config is passed to the tool.
pub async fn execute_tool(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(name): Path<String>,
    body: Bytes,
) -> RuntimeResult<Json<ToolExecutionResponse>> {
    if !state.tools.contains(&name) {
        return Err(RuntimeError::not_found("Tool", &name, request_id));
    }

    let request: ExecuteToolRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ExecuteToolRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| RuntimeError::invalid_json(e.to_string(), request_id.clone()))?
    };

    let config = match request.agent_id.as_deref() {
        Some(agent_id) => {
            let link = state.store.find_agent_tool(agent_id, &name).ok_or_else(|| {
                RuntimeError::not_found(
                    "AgentTool",
                    AgentTool::key_for(agent_id, &name),
                    request_id.clone(),
                )
            })?;
            if !link.enabled {
                return Err(RuntimeError::invalid_input(
                    "agentId",
                    format!("tool '{name}' is disabled for this agent"),
                    request_id,
                ));
            }
            Some(link.config)
        }
        None => None,
    };

    let result = state
        .tools
        .execute_tool(&name, request.input, config)
        .await
        .map_err(|e| {
            if e.is_client_error() {
                debug!(tool = %e.tool(), error = %e, "Tool rejected input");
            } else {
                warn!(tool = %e.tool(), error = %e, "Tool execution failed");
            }
            RuntimeError::from_tool(e, request_id.clone())
        })?;

    info!(tool = %name, agent_id = ?request.agent_id, "Tool executed");
    Ok(Json(ToolExecutionResponse { tool: name, result }))
}
