//! Agent-to-tool associations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Association between an agent and a registry tool
///
/// At most one association exists per `(agent_id, tool_id)` pair; the
/// record store keys associations by that pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTool {
    pub id: String,
    pub agent_id: String,
    /// Registry name of the tool
    pub tool_id: String,
    pub enabled: bool,
    /// Per-association configuration passed to the tool on execution
    pub config: Value,
    /// Display ordering only
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentTool {
    pub fn new(agent_id: impl Into<String>, tool_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            tool_id: tool_id.into(),
            enabled: true,
            config: Value::Object(Default::default()),
            priority: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Store key for an association
    pub fn key_for(agent_id: &str, tool_id: &str) -> String {
        format!("{agent_id}:{tool_id}")
    }

    pub fn apply(&mut self, update: AgentToolUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(config) = update.config {
            self.config = config;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update of an association
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentToolUpdate {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub priority: Option<i32>,
}
