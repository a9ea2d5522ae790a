//! Execution records: one run of an agent against an input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::task::{Task, TaskStatus};

/// Lifecycle status of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected while an execution runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    /// Chunks received from the hosting service
    pub chunk_count: u64,
    /// Characters of output accumulated so far
    pub output_characters: u64,
    pub task_count: u64,
    pub completed_tasks: u64,
    /// Time from start until the first chunk arrived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// One run of an agent, tracked with its child tasks and metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: String,
    pub agent_id: String,
    pub session_id: String,
    pub input: String,
    pub status: ExecutionStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Wall-clock duration in milliseconds, set once terminal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub metrics: ExecutionMetrics,
}

impl Execution {
    /// Start a new running execution. A session id is generated when none is given.
    pub fn start(
        agent_id: impl Into<String>,
        input: impl Into<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            session_id: session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            input: input.into(),
            status: ExecutionStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            duration: None,
            output: None,
            tasks: Vec::new(),
            metrics: ExecutionMetrics::default(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Append a task and refresh task counters.
    pub fn push_task(&mut self, task: Task) {
        self.tasks.push(task);
        self.refresh_task_metrics();
    }

    /// Whether every task has reached a terminal status
    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.iter().all(Task::is_terminal)
    }

    /// Advance the first unfinished task. Returns whether anything changed.
    pub fn advance_active_task(&mut self, increment: u8) -> bool {
        let changed = self
            .tasks
            .iter_mut()
            .find(|t| !t.is_terminal())
            .is_some_and(|task| task.advance(increment));
        if changed {
            self.refresh_task_metrics();
        }
        changed
    }

    /// Record an incremental chunk of remote output.
    pub fn append_output(&mut self, chunk: &str) {
        if self.metrics.chunk_count == 0 {
            let elapsed = Utc::now() - self.start_time;
            self.metrics.latency_ms = Some(elapsed.num_milliseconds().max(0) as u64);
        }
        self.metrics.chunk_count += 1;
        self.metrics.output_characters += chunk.chars().count() as u64;
        self.output.get_or_insert_with(String::new).push_str(chunk);
    }

    /// Mark the execution complete; unfinished tasks are completed with it.
    pub fn complete(&mut self) {
        for task in self.tasks.iter_mut().filter(|t| !t.is_terminal()) {
            task.complete(None);
        }
        self.finish(ExecutionStatus::Complete);
    }

    /// Mark the execution failed; unfinished tasks carry the error.
    pub fn fail(&mut self, error: &str) {
        for task in self.tasks.iter_mut().filter(|t| !t.is_terminal()) {
            task.fail(error);
        }
        self.finish(ExecutionStatus::Failed);
    }

    pub fn cancel(&mut self) {
        for task in self.tasks.iter_mut().filter(|t| !t.is_terminal()) {
            task.fail("cancelled");
        }
        self.finish(ExecutionStatus::Cancelled);
    }

    fn finish(&mut self, status: ExecutionStatus) {
        let now = Utc::now();
        self.status = status;
        self.end_time = Some(now);
        self.duration = Some((now - self.start_time).num_milliseconds().max(0) as u64);
        self.refresh_task_metrics();
    }

    fn refresh_task_metrics(&mut self) {
        self.metrics.task_count = self.tasks.len() as u64;
        self.metrics.completed_tasks = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Complete)
            .count() as u64;
    }
}
