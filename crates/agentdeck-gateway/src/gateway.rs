//! The gateway capability interface.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::GatewayResult;
use crate::types::{
    AgentDefinition, AgentPage, InvocationChunk, InvokeRequest, Preparation, RemoteAgent,
};

/// Stream of invocation output
///
/// The stream is server-driven and cannot be restarted. It ends when the
/// remote side closes its response; dropping it releases the connection.
pub type ChunkStream = Pin<Box<dyn Stream<Item = GatewayResult<InvocationChunk>> + Send>>;

/// Façade over a remote agent-hosting service
///
/// Every failure is returned to the caller as a [`GatewayError`]; nothing
/// is retried. Agent creation is not idempotent, so callers must not retry
/// it blindly either.
///
/// [`GatewayError`]: crate::GatewayError
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Short description of the backing service, used in logs and health output
    fn describe(&self) -> String;

    async fn create_agent(&self, definition: &AgentDefinition) -> GatewayResult<RemoteAgent>;

    async fn update_agent(
        &self,
        agent_id: &str,
        definition: &AgentDefinition,
    ) -> GatewayResult<RemoteAgent>;

    async fn delete_agent(&self, agent_id: &str) -> GatewayResult<()>;

    async fn get_agent(&self, agent_id: &str) -> GatewayResult<RemoteAgent>;

    async fn list_agents(
        &self,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> GatewayResult<AgentPage>;

    /// Ask the service to build the agent so it can be invoked.
    async fn prepare_agent(&self, agent_id: &str) -> GatewayResult<Preparation>;

    /// Start an invocation and return its output as a lazy stream.
    async fn invoke_agent_stream(&self, request: InvokeRequest) -> GatewayResult<ChunkStream>;
}
