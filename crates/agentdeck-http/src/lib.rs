//! # AgentDeck HTTP Runtime
//!
//! The REST and server-sent-event surface of the AgentDeck dashboard
//! backend, built on Axum.
//!
//! ## Features
//!
//! - **Agents**: CRUD, remote preparation and streamed invocation
//! - **Executions**: listing, cancellation and live event streams
//! - **Tasks**: delegation onto executions
//! - **Tools**: the tool registry and per-agent tool associations

pub mod runtime;

// Re-export main types for public API
pub use runtime::*;
