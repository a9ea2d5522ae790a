//! # AgentDeck Gateway
//!
//! Façade over a remote agent-hosting service: create, update, delete,
//! fetch, list, prepare and stream-invoke agents.
//!
//! The [`AgentGateway`] trait is the seam the HTTP layer depends on, and
//! [`HttpAgentGateway`] is its REST implementation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use agentdeck_gateway::{AgentGateway, HttpAgentGateway, InvokeRequest};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), agentdeck_gateway::GatewayError> {
//! let gateway = HttpAgentGateway::new("https://agents.example.com")?
//!     .with_api_key("x-api-key", "secret");
//!
//! let mut stream = gateway
//!     .invoke_agent_stream(InvokeRequest {
//!         agent_id: "AG1".into(),
//!         agent_alias_id: "TSTALIASID".into(),
//!         session_id: "session-1".into(),
//!         input_text: "Hello".into(),
//!     })
//!     .await?;
//!
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?.data);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod gateway;
pub mod types;

pub use client::{AuthConfig, DEFAULT_TIMEOUT, HttpAgentGateway, STREAMING_TIMEOUT};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{AgentGateway, ChunkStream};
pub use types::{
    AgentDefinition, AgentPage, InvocationChunk, InvokeRequest, Preparation, RemoteAgent,
};
