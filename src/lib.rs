//! # AgentDeck
//!
//! AgentDeck is the backend of a dashboard for managed AI agents. It keeps
//! agents, executions, delegated tasks and tool associations in memory,
//! fronts a remote agent-hosting service, and relays execution progress to
//! browsers as server-sent events.
//!
//! ## Crates
//!
//! - **agentdeck-core**: domain records, the [`RecordStore`] and the [`TaskDelegator`]
//! - **agentdeck-gateway**: the [`AgentGateway`] seam and its REST client
//! - **agentdeck-tools**: the [`ToolRegistry`] and the standard tools
//! - **agentdeck-http**: the Axum [`router`], configuration and stream relay
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agentdeck_workspace::{AppState, ServerConfigBuilder, router, shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfigBuilder::new()
//!         .bind_addr("127.0.0.1:3000")
//!         .build()?;
//!     let addr = config.bind_addr;
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, router(AppState::new(config)?))
//!         .with_graceful_shutdown(shutdown_signal())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub use agentdeck_core::{
    Agent, AgentDraft, AgentPatch, AgentStatus, AgentTool, AgentToolUpdate, CoreError,
    CoreResult, DelegateTask, DelegationReceipt, Execution, ExecutionMetrics, ExecutionStatus,
    ExecutionTarget, Record, RecordStore, Task, TaskDelegator, TaskPriority, TaskStatus,
};
pub use agentdeck_gateway::{
    AgentGateway, ChunkStream, GatewayError, GatewayResult, HttpAgentGateway, InvocationChunk,
    InvokeRequest,
};
pub use agentdeck_http::{
    AppState, ConfigError, EXECUTION_ID_HEADER, ErrorResponse, ExecutionRelay, RelayMode,
    RuntimeError, ServerConfig, ServerConfigBuilder, StreamEvent, StreamHub, router,
    shutdown_signal,
};
pub use agentdeck_tools::{ExecutionResult, Tool, ToolDescriptor, ToolError, ToolRegistry};

/// Domain layer
pub mod domain {
    pub use agentdeck_core::*;
}

/// Remote agent-hosting service client
pub mod gateway {
    pub use agentdeck_gateway::*;
}

/// HTTP runtime
pub mod http {
    pub use agentdeck_http::*;
}

/// Tool registry and standard tools
pub mod tools {
    pub use agentdeck_tools::*;
}
