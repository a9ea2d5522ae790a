//! Task records owned by an execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound for task progress
pub const MAX_PROGRESS: u8 = 100;

/// Status of a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Complete,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested priority of a delegated task; stored, not scheduled
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A unit of work within an execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub execution_id: String,
    pub agent_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub progress: u8,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a pending task owned by `execution_id`.
    pub fn new(
        execution_id: impl Into<String>,
        agent_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            execution_id: execution_id.into(),
            agent_id: agent_id.into(),
            name: name.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            progress: 0,
            priority: TaskPriority::default(),
            input: String::new(),
            tools: Vec::new(),
            deadline: None,
            dependencies: Vec::new(),
            output: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move progress forward by `increment`, clamped to 100.
    ///
    /// Progress never decreases and terminal tasks are left untouched. A
    /// pending task starts running on its first advance; reaching 100
    /// completes it. Returns whether the task changed.
    pub fn advance(&mut self, increment: u8) -> bool {
        if self.is_terminal() || increment == 0 {
            return false;
        }
        if self.status == TaskStatus::Pending {
            self.status = TaskStatus::Running;
        }
        self.progress = self.progress.saturating_add(increment).min(MAX_PROGRESS);
        if self.progress == MAX_PROGRESS {
            self.complete(None);
        } else {
            self.updated_at = Utc::now();
        }
        true
    }

    pub fn complete(&mut self, output: Option<String>) {
        let now = Utc::now();
        self.status = TaskStatus::Complete;
        self.progress = MAX_PROGRESS;
        if output.is_some() {
            self.output = output;
        }
        self.updated_at = now;
        self.completed_at = Some(now);
    }

    /// Mark the task failed; progress is kept where it stopped.
    pub fn fail(&mut self, error: impl Into<String>) {
        let now = Utc::now();
        self.status = TaskStatus::Error;
        self.error = Some(error.into());
        self.updated_at = now;
        self.completed_at = Some(now);
    }
}
