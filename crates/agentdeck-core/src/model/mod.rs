//! Domain records shared by every AgentDeck component.
//!
//! All records serialize as camelCase JSON, which is the shape the
//! dashboard consumes directly.

pub mod agent;
pub mod execution;
pub mod task;
pub mod tool;

pub use agent::{Agent, AgentDraft, AgentPatch, AgentStatus, DEFAULT_IDLE_SESSION_TTL_SECS};
pub use execution::{Execution, ExecutionMetrics, ExecutionStatus};
pub use task::{MAX_PROGRESS, Task, TaskPriority, TaskStatus};
pub use tool::{AgentTool, AgentToolUpdate};
