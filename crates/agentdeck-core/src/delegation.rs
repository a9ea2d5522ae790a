//! Task delegation.
//!
//! A delegated task always belongs to exactly one execution. The caller
//! names the owner explicitly through [`ExecutionTarget`]: either an
//! existing execution of the same agent, or a new one created on demand.
//!
//! Priority, deadline and dependencies are recorded on the task but no
//! scheduler acts on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::model::{Agent, Execution, Task, TaskPriority};
use crate::store::{Record, RecordStore};

/// Default number of tasks returned by [`TaskDelegator::get_agent_tasks`]
pub const DEFAULT_TASK_LIMIT: usize = 10;

/// Upper bound for [`TaskDelegator::get_agent_tasks`]
pub const MAX_TASK_LIMIT: usize = 100;

/// Which execution a delegated task is registered against
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExecutionTarget {
    /// Append to an existing execution of the same agent
    Existing(String),
    /// Create a new running execution for the task
    #[default]
    CreateNew,
}

/// A request to delegate work to an agent
#[derive(Debug, Clone, Default)]
pub struct DelegateTask {
    pub agent_id: String,
    pub name: String,
    pub description: String,
    pub priority: TaskPriority,
    pub input: String,
    pub tools: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub dependencies: Vec<String>,
    pub target: ExecutionTarget,
}

/// Acknowledgement returned for an accepted task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationReceipt {
    pub task_id: String,
    pub execution_id: String,
    pub accepted: bool,
}

/// Creates and looks up delegated tasks
#[derive(Debug, Clone)]
pub struct TaskDelegator {
    store: Arc<RecordStore>,
}

impl TaskDelegator {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Register a pending task against its owning execution.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] if the task name is blank
    /// - [`CoreError::NotFound`] if the agent or the target execution is unknown
    /// - [`CoreError::InvalidState`] if the target execution belongs to another
    ///   agent or has already finished
    ///
    /// No record is written when an error is returned.
    pub fn delegate_task(&self, request: DelegateTask) -> CoreResult<DelegationReceipt> {
        if request.name.trim().is_empty() {
            return Err(CoreError::validation("taskName", "must not be empty"));
        }
        if self.store.get::<Agent>(&request.agent_id).is_none() {
            return Err(CoreError::not_found(Agent::KIND, &request.agent_id));
        }

        let DelegateTask {
            agent_id,
            name,
            description,
            priority,
            input,
            tools,
            deadline,
            dependencies,
            target,
        } = request;

        let build_task = |execution_id: &str| {
            let mut task = Task::new(execution_id, agent_id.as_str(), name.as_str())
                .with_description(description.as_str())
                .with_input(input.as_str())
                .with_priority(priority);
            task.tools = tools.clone();
            task.deadline = deadline;
            task.dependencies = dependencies.clone();
            task
        };

        let (task_id, execution_id) = match target {
            ExecutionTarget::Existing(execution_id) => {
                let mut outcome = Err(CoreError::not_found(Execution::KIND, &execution_id));
                self.store.update::<Execution>(&execution_id, |execution| {
                    outcome = if execution.agent_id != agent_id {
                        Err(CoreError::invalid_state(
                            Execution::KIND,
                            &execution.id,
                            format!("owned by agent {}", execution.agent_id),
                        ))
                    } else if execution.is_terminal() {
                        Err(CoreError::invalid_state(
                            Execution::KIND,
                            &execution.id,
                            execution.status,
                        ))
                    } else {
                        let task = build_task(&execution.id);
                        let task_id = task.id.clone();
                        execution.push_task(task);
                        Ok(task_id)
                    };
                });
                (outcome?, execution_id)
            }
            ExecutionTarget::CreateNew => {
                let mut execution = Execution::start(agent_id.as_str(), input.as_str(), None);
                let task = build_task(&execution.id);
                let task_id = task.id.clone();
                execution.push_task(task);
                let execution_id = execution.id.clone();
                self.store.save(execution);
                debug!(execution_id = %execution_id, "Created execution for delegated task");
                (task_id, execution_id)
            }
        };

        info!(
            agent_id = %agent_id,
            task_id = %task_id,
            execution_id = %execution_id,
            priority = ?priority,
            "Task delegated"
        );

        Ok(DelegationReceipt {
            task_id,
            execution_id,
            accepted: true,
        })
    }

    /// Look up a task by id across all executions.
    pub fn get_task_status(&self, task_id: &str) -> Option<Task> {
        self.store
            .list::<Execution>()
            .into_iter()
            .find_map(|execution| execution.task(task_id).cloned())
    }

    /// Most recent tasks of an agent, newest first, at most `limit` long.
    pub fn get_agent_tasks(&self, agent_id: &str, limit: usize) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .store
            .executions_for_agent(agent_id)
            .into_iter()
            .flat_map(|execution| execution.tasks)
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(limit.min(MAX_TASK_LIMIT));
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgentDraft, AgentStatus, TaskStatus};

    fn setup() -> (Arc<RecordStore>, TaskDelegator, Agent) {
        let store = Arc::new(RecordStore::new());
        let agent = Agent::from_draft(
            AgentDraft {
                agent_name: "Bot".into(),
                instructions: "help".into(),
                foundation_model: "m".into(),
                ..Default::default()
            },
            AgentStatus::Prepared,
        );
        store.save(agent.clone());
        (Arc::clone(&store), TaskDelegator::new(store), agent)
    }

    fn request(agent_id: &str, name: &str) -> DelegateTask {
        DelegateTask {
            agent_id: agent_id.into(),
            name: name.into(),
            description: "d".into(),
            input: "x".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_delegate_creates_execution_on_demand() {
        let (store, delegator, agent) = setup();
        let receipt = delegator.delegate_task(request(&agent.id, "t")).unwrap();
        assert!(receipt.accepted);

        let execution = store.get::<Execution>(&receipt.execution_id).unwrap();
        assert_eq!(execution.agent_id, agent.id);
        assert_eq!(execution.input, "x");
        assert_eq!(execution.tasks.len(), 1);

        let task = delegator.get_task_status(&receipt.task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.execution_id, receipt.execution_id);
        assert_eq!(task.name, "t");
    }

    #[test]
    fn test_delegate_to_unknown_agent_creates_nothing() {
        let (store, delegator, _) = setup();
        let err = delegator.delegate_task(request("a1", "t")).unwrap_err();
        assert!(err.is_not_found());
        assert!(store.list::<Execution>().is_empty());
    }

    #[test]
    fn test_delegate_rejects_blank_name() {
        let (store, delegator, agent) = setup();
        let err = delegator.delegate_task(request(&agent.id, " ")).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert!(store.list::<Execution>().is_empty());
    }

    #[test]
    fn test_delegate_into_existing_execution() {
        let (store, delegator, agent) = setup();
        let execution = Execution::start(agent.id.as_str(), "run", None);
        store.save(execution.clone());

        let mut req = request(&agent.id, "second");
        req.target = ExecutionTarget::Existing(execution.id.clone());
        let receipt = delegator.delegate_task(req).unwrap();

        assert_eq!(receipt.execution_id, execution.id);
        assert_eq!(store.list::<Execution>().len(), 1);
        assert_eq!(store.get::<Execution>(&execution.id).unwrap().tasks.len(), 1);
    }

    #[test]
    fn test_delegate_into_foreign_or_finished_execution_fails() {
        let (store, delegator, agent) = setup();

        let foreign = Execution::start("someone-else", "run", None);
        store.save(foreign.clone());
        let mut req = request(&agent.id, "t");
        req.target = ExecutionTarget::Existing(foreign.id.clone());
        assert!(matches!(
            delegator.delegate_task(req).unwrap_err(),
            CoreError::InvalidState { .. }
        ));

        let mut finished = Execution::start(agent.id.as_str(), "run", None);
        finished.complete();
        store.save(finished.clone());
        let mut req = request(&agent.id, "t");
        req.target = ExecutionTarget::Existing(finished.id.clone());
        assert!(delegator.delegate_task(req).is_err());

        let mut req = request(&agent.id, "t");
        req.target = ExecutionTarget::Existing("missing".into());
        assert!(delegator.delegate_task(req).unwrap_err().is_not_found());
    }

    #[test]
    fn test_agent_tasks_newest_first_and_bounded() {
        let (_, delegator, agent) = setup();
        let mut ids = Vec::new();
        for i in 0..5 {
            let receipt = delegator
                .delegate_task(request(&agent.id, &format!("task-{i}")))
                .unwrap();
            ids.push(receipt.task_id);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let tasks = delegator.get_agent_tasks(&agent.id, 3);
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].name, "task-4");
        assert_eq!(tasks[2].name, "task-2");

        assert!(delegator.get_agent_tasks("other", DEFAULT_TASK_LIMIT).is_empty());
        assert!(delegator.get_task_status("missing").is_none());
    }
}
