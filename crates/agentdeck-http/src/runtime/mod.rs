//! # Runtime Module
//!
//! The HTTP runtime of AgentDeck: configuration, shared state, the route
//! handlers and the execution stream relay.
//!
//! ## Usage Pattern
//!
//! ```rust,no_run
//! use agentdeck_http::{AppState, ServerConfigBuilder, router};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfigBuilder::from_env()?.build()?;
//! let addr = config.bind_addr;
//! let app = router(AppState::new(config)?);
//!
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, app)
//!     .with_graceful_shutdown(agentdeck_http::shutdown_signal())
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Environment-driven server configuration.
pub mod config;
/// Unified error handling and request ids.
pub mod error;
/// HTTP request handlers organized by resource.
pub mod handlers;
/// Server-sent event streams for executions.
pub mod relay;
/// HTTP router configuration and route registration.
pub mod router;
/// Signal handling for graceful shutdown.
pub mod shutdown;
/// Shared application state.
pub mod state;
/// Request and response bodies.
pub mod types;

pub use config::{ConfigError, RemoteConfig, ServerConfig, ServerConfigBuilder};
pub use error::{
    ApiJson, ErrorCode, ErrorResponse, REQUEST_ID_HEADER, RequestId, RuntimeError,
    RuntimeErrorKind, RuntimeResult,
};
pub use handlers::EXECUTION_ID_HEADER;
pub use relay::{ExecutionRelay, RelayMode, StreamEvent, StreamHub};
pub use router::router;
pub use shutdown::shutdown_signal;
pub use state::AppState;
