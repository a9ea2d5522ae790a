//! Gateway error types.

use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors reported by the remote agent-hosting service or the transport
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote resource does not exist
    #[error("Remote resource not found: {resource}")]
    NotFound { resource: String },

    /// The service rejected the request as invalid
    #[error("Request rejected: {reason}")]
    Rejected { reason: String },

    /// Credentials missing or refused
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// The service is throttling this client
    #[error("Throttled: retry after {retry_after_seconds} seconds")]
    Throttled { retry_after_seconds: u64 },

    /// Any other non-success response
    #[error("Remote service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// Connection could not be established or was lost
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Request timeout
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Response body did not match the expected shape
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The service reported an error inside an invocation stream
    #[error("Invocation stream error: {message}")]
    Stream { message: String },

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl GatewayError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    /// Map a transport error, keeping timeouts distinguishable.
    pub(crate) fn from_transport(err: reqwest::Error, context: &str, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_ms }
        } else {
            Self::connection(format!("{context}: {err}"))
        }
    }

    /// Whether the same call could succeed if attempted again.
    ///
    /// Nothing in AgentDeck retries; this only classifies the failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } | Self::Throttled { .. } => true,
            Self::Service { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
