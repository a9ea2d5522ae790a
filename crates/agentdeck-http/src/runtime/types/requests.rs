//! Request type definitions for HTTP endpoints
//!
//! Agent creation and updates take [`AgentDraft`] and [`AgentPatch`]
//! directly; association updates take [`AgentToolUpdate`].
//!
//! [`AgentDraft`]: agentdeck_core::AgentDraft
//! [`AgentPatch`]: agentdeck_core::AgentPatch
//! [`AgentToolUpdate`]: agentdeck_core::AgentToolUpdate

use agentdeck_core::{DelegateTask, ExecutionTarget, TaskPriority};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /agents/{id}/invoke-stream`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeStreamRequest {
    pub input: String,
    /// Continue an existing conversation; a new session is started otherwise
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Body of `POST /agents/{id}/tools`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToolRequest {
    pub tool_id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub priority: Option<i32>,
}

/// Query of `GET /agents/{id}/tasks`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Body of `POST /executions`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExecutionRequest {
    pub agent_id: String,
    pub input: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Query of `GET /executions`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionListQuery {
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Body of `POST /tasks/delegate`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateTaskRequest {
    pub agent_id: String,
    #[serde(alias = "name")]
    pub task_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Attach to this execution instead of creating one
    #[serde(default)]
    pub execution_id: Option<String>,
}

impl From<DelegateTaskRequest> for DelegateTask {
    fn from(request: DelegateTaskRequest) -> Self {
        Self {
            agent_id: request.agent_id,
            name: request.task_name,
            description: request.description,
            priority: request.priority,
            input: request.input,
            tools: request.tools,
            deadline: request.deadline,
            dependencies: request.dependencies,
            target: request
                .execution_id
                .map_or(ExecutionTarget::CreateNew, ExecutionTarget::Existing),
        }
    }
}

/// Body of `POST /tools/{name}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteToolRequest {
    #[serde(default = "empty_object")]
    pub input: Value,
    /// Run with this agent's association config; the association must be enabled
    #[serde(default)]
    pub agent_id: Option<String>,
}

impl Default for ExecuteToolRequest {
    fn default() -> Self {
        Self {
            input: empty_object(),
            agent_id: None,
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}
