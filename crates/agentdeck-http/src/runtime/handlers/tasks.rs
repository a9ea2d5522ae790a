//! Task delegation HTTP handlers

use agentdeck_core::DelegationReceipt;
use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::info;

use crate::runtime::{
    error::{ApiJson, IntoRuntimeError, RequestId, RuntimeError, RuntimeResult},
    state::AppState,
    types::{DelegateTaskRequest, TaskResponse},
};

/// POST /tasks/delegate - Register a task against an execution
///
/// Without `executionId` a new running execution is created for the task.
pub async fn delegate_task(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(request): ApiJson<DelegateTaskRequest>,
) -> RuntimeResult<Json<DelegationReceipt>> {
    let agent_id = request.agent_id.clone();
    let receipt = state
        .delegator
        .delegate_task(request.into())
        .into_runtime_error(&request_id)?;

    info!(
        agent_id = %agent_id,
        task_id = %receipt.task_id,
        execution_id = %receipt.execution_id,
        "Task delegated"
    );
    Ok(Json(receipt))
}

/// GET /tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(task_id): Path<String>,
) -> RuntimeResult<Json<TaskResponse>> {
    let task = state
        .delegator
        .get_task_status(&task_id)
        .ok_or_else(|| RuntimeError::not_found("Task", &task_id, request_id))?;
    Ok(Json(TaskResponse { task }))
}
