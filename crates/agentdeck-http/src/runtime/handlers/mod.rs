//! HTTP request handlers
//!
//! This module contains all the HTTP endpoint handlers organized by functionality.

pub mod agent_tools;
pub mod agents;
pub mod executions;
pub mod health;
pub mod tasks;
pub mod tools;

pub use agent_tools::*;
pub use agents::*;
pub use executions::*;
pub use health::*;
pub use tasks::*;
pub use tools::*;

use agentdeck_core::Agent;

use crate::runtime::{
    error::{RequestId, RuntimeError, RuntimeResult},
    state::AppState,
};

/// Response header carrying the id of an execution started by a stream request
pub const EXECUTION_ID_HEADER: &str = "x-execution-id";

/// Look up an agent or fail with 404.
pub(crate) fn require_agent(
    state: &AppState,
    agent_id: &str,
    request_id: &RequestId,
) -> RuntimeResult<Agent> {
    state
        .store
        .get::<Agent>(agent_id)
        .ok_or_else(|| RuntimeError::not_found("Agent", agent_id, request_id.clone()))
}
