//! Response type definitions for HTTP endpoints
//!
//! The task delegation endpoint returns [`DelegationReceipt`] as is.
//!
//! [`DelegationReceipt`]: agentdeck_core::DelegationReceipt

use agentdeck_core::{Agent, AgentTool, Execution, Task};
use agentdeck_gateway::Preparation;
use agentdeck_tools::ToolDescriptor;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct AgentsListResponse {
    pub agents: Vec<Agent>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub agent: Agent,
}

/// Response of `POST /agents/{id}/prepare`
#[derive(Debug, Serialize)]
pub struct PrepareAgentResponse {
    pub agent: Agent,
    pub preparation: Preparation,
}

/// Acknowledgement of a deletion
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

/// Tools attached to one agent
#[derive(Debug, Serialize)]
pub struct AgentToolsResponse {
    pub tools: Vec<AgentTool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentToolResponse {
    pub agent_tool: AgentTool,
}

#[derive(Debug, Serialize)]
pub struct ExecutionsListResponse {
    pub executions: Vec<Execution>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    pub execution: Execution,
}

/// Registered tools
#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub tool: ToolDescriptor,
}

/// Output of a direct tool run
#[derive(Debug, Serialize)]
pub struct ToolExecutionResponse {
    pub tool: String,
    pub result: Value,
}
