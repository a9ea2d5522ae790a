//! Handlers for the tools attached to an agent

use agentdeck_core::{AgentTool, AgentToolUpdate};
use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::info;

use super::require_agent;
use crate::runtime::{
    error::{ApiJson, IntoRuntimeError, RequestId, RuntimeError, RuntimeResult},
    state::AppState,
    types::{AgentToolResponse, AgentToolsResponse, AttachToolRequest, SuccessResponse},
};

/// GET /agents/{agent_id}/tools - Associations ordered by priority
pub async fn list_agent_tools(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(agent_id): Path<String>,
) -> RuntimeResult<Json<AgentToolsResponse>> {
    require_agent(&state, &agent_id, &request_id)?;
    Ok(Json(AgentToolsResponse {
        tools: state.store.tools_for_agent(&agent_id),
    }))
}

/// POST /agents/{agent_id}/tools - Attach a registered tool
pub async fn attach_tool(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(agent_id): Path<String>,
    ApiJson(request): ApiJson<AttachToolRequest>,
) -> RuntimeResult<Json<AgentToolResponse>> {
    require_agent(&state, &agent_id, &request_id)?;

    let tool_id = request.tool_id.trim();
    if tool_id.is_empty() {
        return Err(RuntimeError::missing_required_field("toolId", request_id));
    }
    if !state.tools.contains(tool_id) {
        return Err(RuntimeError::not_found("Tool", tool_id, request_id));
    }

    let mut link = AgentTool::new(&agent_id, tool_id);
    if let Some(enabled) = request.enabled {
        link = link.with_enabled(enabled);
    }
    if let Some(config) = request.config {
        link = link.with_config(config);
    }
    if let Some(priority) = request.priority {
        link = link.with_priority(priority);
    }

    let agent_tool = state.store.insert_new(link).into_runtime_error(&request_id)?;
    info!(agent_id = %agent_id, tool = %agent_tool.tool_id, "Tool attached");

    Ok(Json(AgentToolResponse { agent_tool }))
}

/// PUT /agents/{agent_id}/tools/{tool_id} - Change an association
pub async fn update_agent_tool(
    State(state): State<AppState>,
    request_id: RequestId,
    Path((agent_id, tool_id)): Path<(String, String)>,
    ApiJson(update): ApiJson<AgentToolUpdate>,
) -> RuntimeResult<Json<AgentToolResponse>> {
    let key = AgentTool::key_for(&agent_id, &tool_id);
    let agent_tool = state
        .store
        .update::<AgentTool>(&key, |link| link.apply(update))
        .ok_or_else(|| RuntimeError::not_found("AgentTool", key, request_id))?;

    info!(
        agent_id = %agent_id,
        tool = %tool_id,
        enabled = agent_tool.enabled,
        "Tool association updated"
    );
    Ok(Json(AgentToolResponse { agent_tool }))
}

/// DELETE /agents/{agent_id}/tools/{tool_id} - Detach a tool
pub async fn detach_tool(
    State(state): State<AppState>,
    request_id: RequestId,
    Path((agent_id, tool_id)): Path<(String, String)>,
) -> RuntimeResult<Json<SuccessResponse>> {
    let key = AgentTool::key_for(&agent_id, &tool_id);
    state
        .store
        .delete::<AgentTool>(&key)
        .ok_or_else(|| RuntimeError::not_found("AgentTool", key, request_id))?;

    info!(agent_id = %agent_id, tool = %tool_id, "Tool detached");
    Ok(Json(SuccessResponse::ok()))
}
