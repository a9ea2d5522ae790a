//! Shared application state
//!
//! Everything a handler needs is built once at startup and cloned into each
//! request through axum's `State` extractor.

use agentdeck_core::{RecordStore, TaskDelegator};
use agentdeck_gateway::{AgentGateway, GatewayResult, HttpAgentGateway};
use agentdeck_tools::ToolRegistry;
use std::sync::Arc;
use tracing::info;

use crate::runtime::config::ServerConfig;
use crate::runtime::relay::{ExecutionRelay, StreamHub};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    /// Absent when no remote endpoint is configured
    pub gateway: Option<Arc<dyn AgentGateway>>,
    pub tools: Arc<ToolRegistry>,
    pub delegator: TaskDelegator,
    pub hub: Arc<StreamHub>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build the state for `config`, connecting the remote gateway if one
    /// is configured. The standard tools are registered.
    pub fn new(config: ServerConfig) -> GatewayResult<Self> {
        let gateway = match &config.remote {
            Some(remote) => {
                let mut gateway = HttpAgentGateway::new(&remote.endpoint)?
                    .with_timeout(config.request_timeout())
                    .with_streaming_timeout(config.stream_max_lifetime());
                if let Some(key) = &remote.api_key {
                    gateway = gateway.with_api_key("x-api-key", key);
                }
                info!(endpoint = %remote.endpoint, "Remote agent gateway configured");
                Some(Arc::new(gateway) as Arc<dyn AgentGateway>)
            }
            None => {
                info!("No remote endpoint configured; agents are managed locally");
                None
            }
        };

        Ok(Self::with_parts(
            config,
            gateway,
            ToolRegistry::with_standard_tools(),
        ))
    }

    /// Assemble state from explicit parts, for embedding and tests.
    pub fn with_parts(
        config: ServerConfig,
        gateway: Option<Arc<dyn AgentGateway>>,
        tools: ToolRegistry,
    ) -> Self {
        let store = Arc::new(RecordStore::new());
        Self {
            delegator: TaskDelegator::new(Arc::clone(&store)),
            store,
            gateway,
            tools: Arc::new(tools),
            hub: Arc::new(StreamHub::new()),
            config: Arc::new(config),
        }
    }

    pub fn relay(&self) -> ExecutionRelay {
        ExecutionRelay::new(Arc::clone(&self.store), Arc::clone(&self.hub))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gateway", &self.gateway.as_ref().map(|g| g.describe()))
            .field("tools", &self.tools)
            .field("live_streams", &self.hub.live_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
