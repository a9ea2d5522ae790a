//! # AgentDeck Core
//!
//! Domain layer of the AgentDeck dashboard backend.
//!
//! ## Modules
//!
//! - **[model]**: Agent, Execution, Task and AgentTool records
//! - **[store]**: the process-wide [`RecordStore`]
//! - **[delegation]**: the [`TaskDelegator`], which registers tasks against executions
//! - **[error]**: [`CoreError`] shared by the above

pub mod delegation;
pub mod error;
pub mod model;
pub mod store;

pub use delegation::{
    DEFAULT_TASK_LIMIT, DelegateTask, DelegationReceipt, ExecutionTarget, MAX_TASK_LIMIT,
    TaskDelegator,
};
pub use error::{CoreError, CoreResult};
pub use model::{
    Agent, AgentDraft, AgentPatch, AgentStatus, AgentTool, AgentToolUpdate, Execution,
    ExecutionMetrics, ExecutionStatus, MAX_PROGRESS, Task, TaskPriority, TaskStatus,
};
pub use store::{Record, RecordStore};
