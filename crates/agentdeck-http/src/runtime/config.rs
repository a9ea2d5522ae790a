//! # Environment-Based Configuration
//!
//! Server settings are read from environment variables so deployments can
//! change them without a rebuild.
//!
//! ## Environment Variables
//!
//! ### HTTP Server
//! - `AGENTDECK_BIND_ADDR` - Listen address (default: 0.0.0.0:3000)
//! - `AGENTDECK_REQUEST_TIMEOUT_SECS` - Request timeout in seconds (default: 30, max 300)
//! - `AGENTDECK_MAX_BODY_SIZE` - Maximum request body size in bytes (default: 1048576 / 1MB)
//! - `AGENTDECK_ENABLE_CORS` - Enable permissive CORS (default: true)
//!
//! ### Execution Streams
//! - `AGENTDECK_STREAM_MAX_LIFETIME_SECS` - Lifetime of one SSE channel (default: 30)
//! - `AGENTDECK_SIMULATION_ENABLED` - Drive stored executions with simulated progress (default: true)
//! - `AGENTDECK_SIMULATION_TICK_MS` - Interval between simulated updates (default: 1000)
//!
//! ### Remote Agent Service
//! - `AGENTDECK_REMOTE_ENDPOINT` - Base URL of the agent-hosting service; unset runs local-only
//! - `AGENTDECK_REMOTE_API_KEY` - API key sent as `x-api-key`
//! - `AGENTDECK_REMOTE_DEFAULT_ALIAS` - Alias used for invocations when an agent has none (default: TSTALIASID)

use serde::Serialize;
use std::{env, net::SocketAddr, time::Duration};

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_AGENT_ALIAS: &str = "TSTALIASID";

const MAX_BODY_SIZE_LIMIT: usize = 16 * 1024 * 1024;
const MAX_STREAM_LIFETIME_SECS: u64 = 3600;
const MIN_SIMULATION_TICK_MS: u64 = 10;

/// Connection settings for the remote agent-hosting service
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    pub endpoint: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub default_alias: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("default_alias", &self.default_alias)
            .finish()
    }
}

/// Validated server configuration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub request_timeout_secs: u64,
    pub max_body_size: usize,
    pub enable_cors: bool,
    pub stream_max_lifetime_secs: u64,
    pub simulation_enabled: bool,
    pub simulation_tick_ms: u64,
    pub remote: Option<RemoteConfig>,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.stream_max_lifetime_secs)
    }

    pub fn simulation_tick(&self) -> Duration {
        Duration::from_millis(self.simulation_tick_ms)
    }

    /// Alias used to invoke agents that have none of their own
    pub fn default_alias(&self) -> &str {
        self.remote
            .as_ref()
            .map_or(DEFAULT_AGENT_ALIAS, |remote| remote.default_alias.as_str())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            request_timeout_secs: 30,
            max_body_size: 1024 * 1024,
            enable_cors: true,
            stream_max_lifetime_secs: 30,
            simulation_enabled: true,
            simulation_tick_ms: 1000,
            remote: None,
        }
    }
}

/// Builder for [`ServerConfig`] with environment variable support
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    bind_addr: String,
    request_timeout_secs: u64,
    max_body_size: usize,
    enable_cors: bool,
    stream_max_lifetime_secs: u64,
    simulation_enabled: bool,
    simulation_tick_ms: u64,
    remote_endpoint: Option<String>,
    remote_api_key: Option<String>,
    remote_default_alias: String,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            request_timeout_secs: defaults.request_timeout_secs,
            max_body_size: defaults.max_body_size,
            enable_cors: defaults.enable_cors,
            stream_max_lifetime_secs: defaults.stream_max_lifetime_secs,
            simulation_enabled: defaults.simulation_enabled,
            simulation_tick_ms: defaults.simulation_tick_ms,
            remote_endpoint: None,
            remote_api_key: None,
            remote_default_alias: DEFAULT_AGENT_ALIAS.to_string(),
        }
    }
}

impl ServerConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(addr) = get_env_string("AGENTDECK_BIND_ADDR") {
            builder = builder.bind_addr(addr);
        }
        if let Some(timeout) = get_env_u64("AGENTDECK_REQUEST_TIMEOUT_SECS")? {
            builder = builder.request_timeout_secs(timeout);
        }
        if let Some(max_size) = get_env_usize("AGENTDECK_MAX_BODY_SIZE")? {
            builder = builder.max_body_size(max_size);
        }
        if let Some(cors) = get_env_bool("AGENTDECK_ENABLE_CORS")? {
            builder = builder.enable_cors(cors);
        }

        if let Some(lifetime) = get_env_u64("AGENTDECK_STREAM_MAX_LIFETIME_SECS")? {
            builder = builder.stream_max_lifetime_secs(lifetime);
        }
        if let Some(enabled) = get_env_bool("AGENTDECK_SIMULATION_ENABLED")? {
            builder = builder.simulation_enabled(enabled);
        }
        if let Some(tick) = get_env_u64("AGENTDECK_SIMULATION_TICK_MS")? {
            builder = builder.simulation_tick_ms(tick);
        }

        if let Some(endpoint) = get_env_string("AGENTDECK_REMOTE_ENDPOINT") {
            builder = builder.remote_endpoint(endpoint);
        }
        if let Some(key) = get_env_string("AGENTDECK_REMOTE_API_KEY") {
            builder = builder.remote_api_key(key);
        }
        if let Some(alias) = get_env_string("AGENTDECK_REMOTE_DEFAULT_ALIAS") {
            builder = builder.remote_default_alias(alias);
        }

        Ok(builder)
    }

    #[must_use]
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set request timeout in seconds
    #[must_use]
    pub fn request_timeout_secs(mut self, timeout: u64) -> Self {
        self.request_timeout_secs = timeout;
        self
    }

    /// Set maximum request body size in bytes
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    #[must_use]
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    #[must_use]
    pub fn stream_max_lifetime_secs(mut self, secs: u64) -> Self {
        self.stream_max_lifetime_secs = secs;
        self
    }

    #[must_use]
    pub fn simulation_enabled(mut self, enabled: bool) -> Self {
        self.simulation_enabled = enabled;
        self
    }

    #[must_use]
    pub fn simulation_tick_ms(mut self, tick_ms: u64) -> Self {
        self.simulation_tick_ms = tick_ms;
        self
    }

    #[must_use]
    pub fn remote_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.remote_endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn remote_api_key(mut self, key: impl Into<String>) -> Self {
        self.remote_api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn remote_default_alias(mut self, alias: impl Into<String>) -> Self {
        self.remote_default_alias = alias.into();
        self
    }

    /// Validate configuration and build [`ServerConfig`]
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the configuration is invalid.
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        self.validate()?;

        let bind_addr = self.bind_addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::ValidationError(format!(
                "bind_addr '{}' is not a socket address: {e}",
                self.bind_addr
            ))
        })?;

        let remote = self
            .remote_endpoint
            .filter(|endpoint| !endpoint.trim().is_empty())
            .map(|endpoint| RemoteConfig {
                endpoint,
                api_key: self.remote_api_key.filter(|key| !key.is_empty()),
                default_alias: self.remote_default_alias,
            });

        Ok(ServerConfig {
            bind_addr,
            request_timeout_secs: self.request_timeout_secs,
            max_body_size: self.max_body_size,
            enable_cors: self.enable_cors,
            stream_max_lifetime_secs: self.stream_max_lifetime_secs,
            simulation_enabled: self.simulation_enabled,
            simulation_tick_ms: self.simulation_tick_ms,
            remote,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs > 300 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be <= 300 (5 minutes)".to_string(),
            ));
        }

        if self.max_body_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_body_size must be greater than 0".to_string(),
            ));
        }
        if self.max_body_size > MAX_BODY_SIZE_LIMIT {
            return Err(ConfigError::ValidationError(
                "max_body_size must be <= 16MB".to_string(),
            ));
        }

        if self.stream_max_lifetime_secs == 0 {
            return Err(ConfigError::ValidationError(
                "stream_max_lifetime_secs must be greater than 0".to_string(),
            ));
        }
        if self.stream_max_lifetime_secs > MAX_STREAM_LIFETIME_SECS {
            return Err(ConfigError::ValidationError(
                "stream_max_lifetime_secs must be <= 3600 (1 hour)".to_string(),
            ));
        }

        if self.simulation_tick_ms < MIN_SIMULATION_TICK_MS {
            return Err(ConfigError::ValidationError(format!(
                "simulation_tick_ms must be >= {MIN_SIMULATION_TICK_MS}"
            )));
        }

        if self.remote_default_alias.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "remote_default_alias cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// Environment variable helper functions

fn get_env_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn get_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!(
                    "invalid boolean value '{val}', expected true/false/1/0/yes/no/on/off"
                ),
            }),
        },
        Err(_) => Ok(None),
    }
}

fn get_env_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid u64 value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn get_env_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<usize>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid usize value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}
