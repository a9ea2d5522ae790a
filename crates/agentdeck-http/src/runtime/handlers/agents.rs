//! Agent management HTTP handlers
//!
//! Agents are mirrored on the remote agent-hosting service when a gateway
//! is configured; otherwise they live only in the record store and are
//! considered prepared as soon as they are created.

use agentdeck_core::{
    Agent, AgentDraft, AgentPatch, AgentStatus, DEFAULT_TASK_LIMIT, Execution, MAX_TASK_LIMIT,
};
use agentdeck_gateway::{AgentDefinition, InvokeRequest};
use axum::{
    extract::{Path, Query, State},
    http::HeaderValue,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

use super::{EXECUTION_ID_HEADER, require_agent};
use crate::runtime::{
    error::{ApiJson, IntoRuntimeError, RequestId, RuntimeError, RuntimeResult},
    relay::{RelayMode, sse_response, with_lifetime},
    state::AppState,
    types::{
        AgentResponse, AgentsListResponse, InvokeStreamRequest, PrepareAgentResponse,
        SuccessResponse, TaskListQuery, TasksResponse,
    },
};

/// GET /agents - List all agents, newest first
pub async fn list_agents(State(state): State<AppState>) -> Json<AgentsListResponse> {
    let mut agents = state.store.list::<Agent>();
    agents.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Json(AgentsListResponse {
        total: agents.len(),
        agents,
    })
}

/// POST /agents - Create an agent
///
/// With a gateway the agent is created remotely first and stored with the
/// identity and status the service returns. Creation is not retried.
pub async fn create_agent(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(draft): ApiJson<AgentDraft>,
) -> RuntimeResult<Json<AgentResponse>> {
    draft.validate().into_runtime_error(&request_id)?;

    let agent = match &state.gateway {
        Some(gateway) => {
            let agent = Agent::from_draft(draft, AgentStatus::Creating);
            let remote = gateway
                .create_agent(&AgentDefinition::from(&agent))
                .await
                .map_err(|e| {
                    RuntimeError::remote_service_failure("create agent", &e, request_id.clone())
                })?;
            agent.with_remote_identity(remote.agent_id, remote.agent_arn, remote.agent_status)
        }
        None => Agent::from_draft(draft, AgentStatus::Prepared),
    };

    state.store.save(agent.clone());
    info!(
        agent_id = %agent.id,
        remote_agent_id = ?agent.agent_id,
        status = %agent.agent_status,
        "Agent created"
    );

    Ok(Json(AgentResponse { agent }))
}

/// GET /agents/{agent_id}
pub async fn get_agent(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(agent_id): Path<String>,
) -> RuntimeResult<Json<AgentResponse>> {
    let agent = require_agent(&state, &agent_id, &request_id)?;
    Ok(Json(AgentResponse { agent }))
}

/// PATCH /agents/{agent_id} - Apply a partial update
///
/// Changes to the definition are pushed to the remote service; local-only
/// fields such as tags and favorites are not.
pub async fn update_agent(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(agent_id): Path<String>,
    ApiJson(patch): ApiJson<AgentPatch>,
) -> RuntimeResult<Json<AgentResponse>> {
    let mut agent = require_agent(&state, &agent_id, &request_id)?;
    patch.validate().into_runtime_error(&request_id)?;

    let touches_remote = patch.touches_remote_definition();
    agent.apply(patch);

    if let (true, Some(gateway), Some(remote_id)) =
        (touches_remote, &state.gateway, agent.agent_id.clone())
    {
        let remote = gateway
            .update_agent(&remote_id, &AgentDefinition::from(&agent))
            .await
            .map_err(|e| RuntimeError::remote_service_failure("update agent", &e, request_id))?;
        agent.set_status(remote.agent_status);
    }

    state.store.save(agent.clone());
    info!(agent_id = %agent.id, "Agent updated");

    Ok(Json(AgentResponse { agent }))
}

/// DELETE /agents/{agent_id}
///
/// The agent's tool associations are removed with it. An agent the remote
/// service no longer knows is still deleted locally.
pub async fn delete_agent(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(agent_id): Path<String>,
) -> RuntimeResult<Json<SuccessResponse>> {
    let agent = require_agent(&state, &agent_id, &request_id)?;

    if let (Some(gateway), Some(remote_id)) = (&state.gateway, &agent.agent_id) {
        match gateway.delete_agent(remote_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!(
                    agent_id = %agent.id,
                    remote_agent_id = %remote_id,
                    "Remote agent already gone"
                );
            }
            Err(e) => {
                return Err(RuntimeError::remote_service_failure(
                    "delete agent",
                    &e,
                    request_id,
                ));
            }
        }
    }

    state.store.delete::<Agent>(&agent.id);
    let detached = state.store.remove_tools_for_agent(&agent.id);
    info!(agent_id = %agent.id, detached_tools = detached, "Agent deleted");

    Ok(Json(SuccessResponse::ok()))
}

/// POST /agents/{agent_id}/prepare - Build the agent on the remote service
pub async fn prepare_agent(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(agent_id): Path<String>,
) -> RuntimeResult<Json<PrepareAgentResponse>> {
    let mut agent = require_agent(&state, &agent_id, &request_id)?;

    let (Some(gateway), Some(remote_id)) = (&state.gateway, agent.agent_id.clone()) else {
        return Err(RuntimeError::invalid_input(
            "agentId",
            "agent has no remote identity to prepare",
            request_id,
        ));
    };

    let preparation = gateway
        .prepare_agent(&remote_id)
        .await
        .map_err(|e| RuntimeError::remote_service_failure("prepare agent", &e, request_id))?;

    agent.set_status(preparation.agent_status);
    state.store.save(agent.clone());
    info!(agent_id = %agent.id, status = %agent.agent_status, "Agent prepared");

    Ok(Json(PrepareAgentResponse { agent, preparation }))
}

/// POST /agents/{agent_id}/invoke-stream - Start an execution and stream it
///
/// Agents with a remote identity are invoked through the gateway. Local
/// agents get a simulated run when simulation is enabled. The new
/// execution's id is returned in the `X-Execution-Id` header.
pub async fn invoke_agent_stream(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(agent_id): Path<String>,
    ApiJson(request): ApiJson<InvokeStreamRequest>,
) -> RuntimeResult<Response> {
    let agent = require_agent(&state, &agent_id, &request_id)?;
    if request.input.trim().is_empty() {
        return Err(RuntimeError::invalid_input(
            "input",
            "must not be empty",
            request_id,
        ));
    }

    let remote = match (&state.gateway, &agent.agent_id) {
        (Some(gateway), Some(remote_id)) => Some((Arc::clone(gateway), remote_id.clone())),
        _ => None,
    };
    if remote.is_none() && !state.config.simulation_enabled {
        return Err(RuntimeError::invalid_input(
            "agentId",
            "agent has no remote identity and simulation is disabled",
            request_id,
        ));
    }

    let execution = Execution::start(&agent.id, &request.input, request.session_id);
    state.store.save(execution.clone());
    state.store.update::<Agent>(&agent.id, Agent::record_execution);

    let mode = match remote {
        Some((gateway, remote_id)) => {
            let invoke = InvokeRequest {
                agent_id: remote_id,
                agent_alias_id: agent
                    .agent_alias_id
                    .clone()
                    .unwrap_or_else(|| state.config.default_alias().to_string()),
                session_id: execution.session_id.clone(),
                input_text: request.input,
            };
            match gateway.invoke_agent_stream(invoke).await {
                Ok(chunks) => RelayMode::Remote(chunks),
                Err(e) => {
                    state
                        .store
                        .update::<Execution>(&execution.id, |stored| stored.fail(&e.to_string()));
                    return Err(RuntimeError::remote_service_failure(
                        "invoke agent",
                        &e,
                        request_id,
                    ));
                }
            }
        }
        None => RelayMode::Simulated {
            tick: state.config.simulation_tick(),
        },
    };

    info!(
        agent_id = %agent.id,
        execution_id = %execution.id,
        session_id = %execution.session_id,
        "Agent invocation started"
    );

    let execution_id = execution.id.clone();
    let events = with_lifetime(
        state.relay().open(execution, mode),
        state.config.stream_max_lifetime(),
    );
    let mut response = sse_response(events).into_response();
    if let Ok(value) = HeaderValue::from_str(&execution_id) {
        response.headers_mut().insert(EXECUTION_ID_HEADER, value);
    }

    Ok(response)
}

/// GET /agents/{agent_id}/tasks?limit=N - Most recent tasks of an agent
pub async fn get_agent_tasks(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(agent_id): Path<String>,
    Query(query): Query<TaskListQuery>,
) -> RuntimeResult<Json<TasksResponse>> {
    require_agent(&state, &agent_id, &request_id)?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_TASK_LIMIT)
        .min(MAX_TASK_LIMIT);
    let tasks = state.delegator.get_agent_tasks(&agent_id, limit);

    Ok(Json(TasksResponse { tasks }))
}
