//! Execution HTTP handlers

use agentdeck_core::{Agent, CoreError, Execution};
use axum::{
    extract::{Path, Query, State},
    response::{
        Json,
        sse::{Event, Sse},
    },
};
use futures::Stream;
use std::convert::Infallible;
use tracing::info;

use super::require_agent;
use crate::runtime::{
    error::{ApiJson, RequestId, RuntimeError, RuntimeResult},
    relay::{RelayMode, sse_response, with_lifetime},
    state::AppState,
    types::{CreateExecutionRequest, ExecutionListQuery, ExecutionResponse, ExecutionsListResponse},
};

/// GET /executions?agentId= - List executions, newest first
pub async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<ExecutionListQuery>,
) -> Json<ExecutionsListResponse> {
    let executions = match query.agent_id.as_deref() {
        Some(agent_id) => state.store.executions_for_agent(agent_id),
        None => {
            let mut all = state.store.list::<Execution>();
            all.sort_by(|a, b| b.start_time.cmp(&a.start_time));
            all
        }
    };

    Json(ExecutionsListResponse {
        total: executions.len(),
        executions,
    })
}

/// POST /executions - Record a new running execution without streaming it
pub async fn create_execution(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(request): ApiJson<CreateExecutionRequest>,
) -> RuntimeResult<Json<ExecutionResponse>> {
    let agent = require_agent(&state, &request.agent_id, &request_id)?;
    if request.input.trim().is_empty() {
        return Err(RuntimeError::invalid_input(
            "input",
            "must not be empty",
            request_id,
        ));
    }

    let execution = Execution::start(&agent.id, request.input, request.session_id);
    state.store.save(execution.clone());
    state.store.update::<Agent>(&agent.id, Agent::record_execution);
    info!(agent_id = %agent.id, execution_id = %execution.id, "Execution created");

    Ok(Json(ExecutionResponse { execution }))
}

/// GET /executions/{execution_id}
pub async fn get_execution(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(execution_id): Path<String>,
) -> RuntimeResult<Json<ExecutionResponse>> {
    let execution = state
        .store
        .get::<Execution>(&execution_id)
        .ok_or_else(|| RuntimeError::not_found("Execution", &execution_id, request_id))?;
    Ok(Json(ExecutionResponse { execution }))
}

/// POST /executions/{execution_id}/cancel
///
/// Running relays notice the cancellation on their next chunk or tick and
/// close with a `complete` event carrying the cancelled execution.
pub async fn cancel_execution(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(execution_id): Path<String>,
) -> RuntimeResult<Json<ExecutionResponse>> {
    let mut finished_as = None;
    let execution = state
        .store
        .update::<Execution>(&execution_id, |execution| {
            if execution.is_terminal() {
                finished_as = Some(execution.status);
            } else {
                execution.cancel();
            }
        })
        .ok_or_else(|| RuntimeError::not_found("Execution", &execution_id, request_id.clone()))?;

    if let Some(status) = finished_as {
        return Err(RuntimeError::from_core(
            CoreError::invalid_state("Execution", &execution_id, status),
            request_id,
        ));
    }

    info!(execution_id = %execution_id, "Execution cancelled");
    Ok(Json(ExecutionResponse { execution }))
}

/// GET /executions/{execution_id}/stream
///
/// Follows the live relay of the execution if one is running. Otherwise a
/// simulated run is started when simulation is enabled and the execution
/// belongs to a local agent. Remote executions are only ever produced by
/// their invocation, so without a live relay the current snapshot is sent
/// alone.
pub async fn stream_execution(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(execution_id): Path<String>,
) -> RuntimeResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let execution = state
        .store
        .get::<Execution>(&execution_id)
        .ok_or_else(|| RuntimeError::not_found("Execution", &execution_id, request_id))?;

    let local_agent = state
        .store
        .get::<Agent>(&execution.agent_id)
        .is_some_and(|agent| !agent.is_remote());
    let mode = if state.config.simulation_enabled && local_agent {
        RelayMode::Simulated {
            tick: state.config.simulation_tick(),
        }
    } else {
        RelayMode::Observe
    };

    Ok(sse_response(with_lifetime(
        state.relay().open(execution, mode),
        state.config.stream_max_lifetime(),
    )))
}
