//! Agent records and their lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Default idle session timeout handed to the hosting service
pub const DEFAULT_IDLE_SESSION_TTL_SECS: u64 = 600;

/// Lifecycle status of an agent as reported by the hosting service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Creating,
    Prepared,
    Failed,
    Updating,
    Deleting,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "CREATING",
            Self::Prepared => "PREPARED",
            Self::Failed => "FAILED",
            Self::Updating => "UPDATING",
            Self::Deleting => "DELETING",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-submitted definition of a new agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub agent_name: String,
    #[serde(default)]
    pub description: String,
    pub instructions: String,
    pub foundation_model: String,
    #[serde(default)]
    pub idle_session_ttl_in_seconds: Option<u64>,
    #[serde(default)]
    pub agent_alias_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl AgentDraft {
    /// Check that every field the hosting service requires is present.
    pub fn validate(&self) -> CoreResult<()> {
        require_non_blank("agentName", &self.agent_name)?;
        require_non_blank("instructions", &self.instructions)?;
        require_non_blank("foundationModel", &self.foundation_model)?;
        if self.idle_session_ttl_in_seconds == Some(0) {
            return Err(CoreError::validation(
                "idleSessionTtlInSeconds",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Partial update of an agent; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub foundation_model: Option<String>,
    #[serde(default)]
    pub idle_session_ttl_in_seconds: Option<u64>,
    #[serde(default)]
    pub agent_alias_id: Option<String>,
    #[serde(default)]
    pub tags: Option<BTreeSet<String>>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
}

impl AgentPatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.agent_name {
            require_non_blank("agentName", name)?;
        }
        if let Some(instructions) = &self.instructions {
            require_non_blank("instructions", instructions)?;
        }
        if let Some(model) = &self.foundation_model {
            require_non_blank("foundationModel", model)?;
        }
        if self.idle_session_ttl_in_seconds == Some(0) {
            return Err(CoreError::validation(
                "idleSessionTtlInSeconds",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Whether the patch changes anything the hosting service knows about
    pub fn touches_remote_definition(&self) -> bool {
        self.agent_name.is_some()
            || self.description.is_some()
            || self.instructions.is_some()
            || self.foundation_model.is_some()
            || self.idle_session_ttl_in_seconds.is_some()
    }
}

fn require_non_blank(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// A configured agent plus its identity on the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Local identifier
    pub id: String,
    /// Identifier assigned by the hosting service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Resource name assigned by the hosting service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_arn: Option<String>,
    /// Alias used when invoking the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_alias_id: Option<String>,
    pub agent_name: String,
    pub description: String,
    pub instructions: String,
    pub foundation_model: String,
    pub idle_session_ttl_in_seconds: u64,
    pub agent_status: AgentStatus,
    pub tags: BTreeSet<String>,
    pub is_favorite: bool,
    pub execution_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Build a new agent record with a fresh local id.
    pub fn from_draft(draft: AgentDraft, status: AgentStatus) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: None,
            agent_arn: None,
            agent_alias_id: draft.agent_alias_id,
            agent_name: draft.agent_name,
            description: draft.description,
            instructions: draft.instructions,
            foundation_model: draft.foundation_model,
            idle_session_ttl_in_seconds: draft
                .idle_session_ttl_in_seconds
                .unwrap_or(DEFAULT_IDLE_SESSION_TTL_SECS),
            agent_status: status,
            tags: draft.tags,
            is_favorite: false,
            execution_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the identity returned by the hosting service.
    pub fn with_remote_identity(
        mut self,
        agent_id: impl Into<String>,
        agent_arn: Option<String>,
        status: AgentStatus,
    ) -> Self {
        self.agent_id = Some(agent_id.into());
        self.agent_arn = agent_arn;
        self.agent_status = status;
        self
    }

    /// Whether the agent exists on the hosting service
    pub fn is_remote(&self) -> bool {
        self.agent_id.is_some()
    }

    pub fn apply(&mut self, patch: AgentPatch) {
        if let Some(name) = patch.agent_name {
            self.agent_name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(instructions) = patch.instructions {
            self.instructions = instructions;
        }
        if let Some(model) = patch.foundation_model {
            self.foundation_model = model;
        }
        if let Some(ttl) = patch.idle_session_ttl_in_seconds {
            self.idle_session_ttl_in_seconds = ttl;
        }
        if let Some(alias) = patch.agent_alias_id {
            self.agent_alias_id = Some(alias);
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(favorite) = patch.is_favorite {
            self.is_favorite = favorite;
        }
        self.touch();
    }

    pub fn set_status(&mut self, status: AgentStatus) {
        self.agent_status = status;
        self.touch();
    }

    pub fn record_execution(&mut self) {
        self.execution_count += 1;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft() -> AgentDraft {
        AgentDraft {
            agent_name: "Bot".into(),
            instructions: "help".into(),
            foundation_model: "amazon.titan-text-lite-v1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_draft_defaults() {
        let agent = Agent::from_draft(draft(), AgentStatus::Prepared);
        assert_eq!(agent.idle_session_ttl_in_seconds, DEFAULT_IDLE_SESSION_TTL_SECS);
        assert_eq!(agent.agent_status, AgentStatus::Prepared);
        assert_eq!(agent.execution_count, 0);
        assert!(!agent.is_remote());
    }

    #[test]
    fn test_ids_are_unique_for_identical_drafts() {
        let a = Agent::from_draft(draft(), AgentStatus::Prepared);
        let b = Agent::from_draft(draft(), AgentStatus::Prepared);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut missing = draft();
        missing.instructions = "   ".into();
        let err = missing.validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "instructions"));

        let mut zero_ttl = draft();
        zero_ttl.idle_session_ttl_in_seconds = Some(0);
        assert!(zero_ttl.validate().is_err());
    }

    #[rstest]
    #[case("agentName")]
    #[case("instructions")]
    #[case("foundationModel")]
    fn test_draft_requires_field(#[case] field: &str) {
        let mut blank = draft();
        match field {
            "agentName" => blank.agent_name.clear(),
            "instructions" => blank.instructions.clear(),
            _ => blank.foundation_model.clear(),
        }
        let err = blank.validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: ref f, .. } if f == field));
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut agent = Agent::from_draft(draft(), AgentStatus::Prepared);
        let before = agent.updated_at;
        agent.apply(AgentPatch {
            description: Some("new".into()),
            is_favorite: Some(true),
            ..Default::default()
        });
        assert_eq!(agent.agent_name, "Bot");
        assert_eq!(agent.description, "new");
        assert!(agent.is_favorite);
        assert!(agent.updated_at >= before);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&AgentStatus::Prepared).unwrap();
        assert_eq!(json, "\"PREPARED\"");
        let agent = Agent::from_draft(draft(), AgentStatus::Creating);
        let value = serde_json::to_value(&agent).unwrap();
        assert_eq!(value["agentStatus"], "CREATING");
        assert_eq!(value["agentName"], "Bot");
        assert!(value.get("agentId").is_none());
    }

    #[test]
    fn test_tags_are_deduplicated() {
        let draft: AgentDraft = serde_json::from_value(serde_json::json!({
            "agentName": "Bot",
            "instructions": "help",
            "foundationModel": "m",
            "tags": ["b", "a", "b"]
        }))
        .unwrap();
        assert_eq!(draft.tags.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
