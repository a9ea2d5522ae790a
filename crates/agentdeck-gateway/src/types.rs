//! Wire types exchanged with the remote agent-hosting service.

use agentdeck_core::{Agent, AgentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Definition of an agent as the hosting service sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub agent_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub instruction: String,
    pub foundation_model: String,
    pub idle_session_ttl_in_seconds: u64,
}

impl From<&Agent> for AgentDefinition {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_name: agent.agent_name.clone(),
            description: agent.description.clone(),
            instruction: agent.instructions.clone(),
            foundation_model: agent.foundation_model.clone(),
            idle_session_ttl_in_seconds: agent.idle_session_ttl_in_seconds,
        }
    }
}

/// Remote identity and status of an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAgent {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_arn: Option<String>,
    pub agent_status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of remote agents
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPage {
    #[serde(default)]
    pub agents: Vec<RemoteAgent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Outcome of asking the service to prepare an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preparation {
    pub agent_id: String,
    pub agent_status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared_at: Option<DateTime<Utc>>,
}

/// Parameters of a streaming invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub agent_id: String,
    pub agent_alias_id: String,
    pub session_id: String,
    pub input_text: String,
}

/// Body of the invoke call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InvokeBody<'a> {
    pub input_text: &'a str,
}

/// Incremental output of an invocation, serialized as `{"type":"chunk","data":..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "chunk")]
pub struct InvocationChunk {
    pub data: String,
}

impl InvocationChunk {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

/// Events the service may send on an invocation stream
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum RemoteEvent {
    Chunk {
        data: String,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    /// Trace and other informational events
    #[serde(other)]
    Other,
}
