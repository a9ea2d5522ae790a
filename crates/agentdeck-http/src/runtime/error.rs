//! Unified error handling for the HTTP runtime
//!
//! Errors carry the request id of the call that produced them, map to an
//! HTTP status and a machine-readable [`ErrorCode`], and are rendered as a
//! sanitized [`ErrorResponse`]. Internal details are logged, never returned.

use agentdeck_core::CoreError;
use agentdeck_gateway::GatewayError;
use agentdeck_tools::ToolError;
use axum::{
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::{
        StatusCode,
        header::{self, HeaderValue},
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::any::Any;
use std::convert::Infallible;
use std::fmt;

/// Maximum length for client-provided request IDs
const MAX_REQUEST_ID_LENGTH: usize = 128;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of one HTTP request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Accept a client-provided id if it is safe to log and echo.
    pub fn parse(s: &str) -> Option<Self> {
        validate_request_id(s).then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Valid request IDs are non-empty, at most 128 characters, and contain only
/// ASCII alphanumerics, hyphens and underscores.
fn validate_request_id(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_REQUEST_ID_LENGTH
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Middleware that extracts or generates the request ID
///
/// The id is stored in request extensions for handlers and error responses
/// and echoed in the `X-Request-ID` response header.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::parse)
        .unwrap_or_else(RequestId::generate);

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if response.extensions().get::<HandlerPanicked>().is_some() {
        response = RuntimeError::internal_error("request handler panicked", request_id.clone())
            .into_response();
    }

    if let Ok(header_value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(
            header::HeaderName::from_static(REQUEST_ID_HEADER),
            header_value,
        );
    }

    response
}

/// Marks the response of a handler that panicked
#[derive(Debug, Clone, Copy)]
struct HandlerPanicked;

/// Response for a panicking handler, for `CatchPanicLayer`.
///
/// The payload is logged and never sent. [`request_id_middleware`] replaces
/// the response with an internal error carrying the request's id.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    tracing::error!(panic = %detail, "Request handler panicked");

    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(HandlerPanicked);
    response
}

/// Handlers receive the id set by [`request_id_middleware`], or a fresh one
/// when the middleware is not installed.
impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(RequestId::generate))
    }
}

/// JSON body extractor whose rejections are [`RuntimeError`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RuntimeError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(RequestId::generate);

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(RuntimeError::from_json_rejection(rejection, request_id)),
        }
    }
}

/// Type-safe error codes for runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    InvalidInput,
    MissingRequiredField,
    DuplicateAssociation,
    InvalidJson,
    PayloadTooLarge,
    RemoteServiceFailure,
    ToolExecutionFailed,
    InternalError,
}

impl ErrorCode {
    /// Get the string representation of this error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::MissingRequiredField => "missing_required_field",
            ErrorCode::DuplicateAssociation => "duplicate_association",
            ErrorCode::InvalidJson => "invalid_json",
            ErrorCode::PayloadTooLarge => "payload_too_large",
            ErrorCode::RemoteServiceFailure => "remote_service_failure",
            ErrorCode::ToolExecutionFailed => "tool_execution_failed",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error response for HTTP APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub request_id: RequestId,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, request_id: RequestId) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            details: None,
            request_id,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Specific error information for different error categories
#[derive(Debug, Clone)]
pub enum RuntimeErrorKind {
    /// A referenced record or tool does not exist
    NotFound { resource: &'static str, id: String },

    /// A field failed validation
    InvalidInput { field: String, reason: String },

    MissingRequiredField { field: String },

    /// The agent already has this tool attached
    DuplicateAssociation { agent_id: String, tool_id: String },

    InvalidJson { reason: String },

    PayloadTooLarge,

    /// The agent-hosting service failed; `operation` names the user action
    RemoteServiceFailure { operation: String, reason: String },

    ToolExecutionFailed { tool_name: String, reason: String },

    InternalError { reason: String },
}

/// Runtime error with the request id of the call that produced it
#[derive(Debug)]
pub struct RuntimeError {
    pub request_id: RequestId,
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, request_id: RequestId) -> Self {
        Self { request_id, kind }
    }

    // ==================== Constructor helpers ====================

    pub fn not_found(resource: &'static str, id: impl Into<String>, request_id: RequestId) -> Self {
        Self::new(
            RuntimeErrorKind::NotFound {
                resource,
                id: id.into(),
            },
            request_id,
        )
    }

    pub fn invalid_input(
        field: impl Into<String>,
        reason: impl Into<String>,
        request_id: RequestId,
    ) -> Self {
        Self::new(
            RuntimeErrorKind::InvalidInput {
                field: field.into(),
                reason: reason.into(),
            },
            request_id,
        )
    }

    pub fn missing_required_field(field: impl Into<String>, request_id: RequestId) -> Self {
        Self::new(
            RuntimeErrorKind::MissingRequiredField {
                field: field.into(),
            },
            request_id,
        )
    }

    pub fn invalid_json(reason: impl Into<String>, request_id: RequestId) -> Self {
        Self::new(
            RuntimeErrorKind::InvalidJson {
                reason: reason.into(),
            },
            request_id,
        )
    }

    pub fn remote_service_failure(
        operation: impl Into<String>,
        error: &GatewayError,
        request_id: RequestId,
    ) -> Self {
        Self::new(
            RuntimeErrorKind::RemoteServiceFailure {
                operation: operation.into(),
                reason: error.to_string(),
            },
            request_id,
        )
    }

    pub fn internal_error(reason: impl Into<String>, request_id: RequestId) -> Self {
        Self::new(
            RuntimeErrorKind::InternalError {
                reason: reason.into(),
            },
            request_id,
        )
    }

    /// Map a domain error.
    pub fn from_core(error: CoreError, request_id: RequestId) -> Self {
        let kind = match error {
            CoreError::NotFound { kind, id } => RuntimeErrorKind::NotFound { resource: kind, id },
            CoreError::Validation { field, reason } => {
                RuntimeErrorKind::InvalidInput { field, reason }
            }
            CoreError::Duplicate { key, .. } => {
                let (agent_id, tool_id) = key
                    .split_once(':')
                    .map(|(a, t)| (a.to_string(), t.to_string()))
                    .unwrap_or_else(|| (key.clone(), String::new()));
                RuntimeErrorKind::DuplicateAssociation { agent_id, tool_id }
            }
            CoreError::InvalidState { kind, id, state } => RuntimeErrorKind::InvalidInput {
                field: kind.to_lowercase(),
                reason: format!("{id} is {state}"),
            },
        };
        Self::new(kind, request_id)
    }

    /// Map a tool registry error.
    pub fn from_tool(error: ToolError, request_id: RequestId) -> Self {
        let kind = match error {
            ToolError::NotFound { name } => RuntimeErrorKind::NotFound {
                resource: "Tool",
                id: name,
            },
            ToolError::MissingField { field, .. } => {
                RuntimeErrorKind::MissingRequiredField { field }
            }
            ToolError::InvalidInput { message, .. } => RuntimeErrorKind::InvalidInput {
                field: "input".to_string(),
                reason: message,
            },
            ToolError::ExecutionFailed { tool, message } => RuntimeErrorKind::ToolExecutionFailed {
                tool_name: tool,
                reason: message,
            },
        };
        Self::new(kind, request_id)
    }

    /// Map a rejected JSON body.
    pub fn from_json_rejection(rejection: JsonRejection, request_id: RequestId) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(RuntimeErrorKind::PayloadTooLarge, request_id);
        }
        let reason = rejection.body_text();
        match (&rejection, missing_field_name(&reason)) {
            (JsonRejection::JsonDataError(_), Some(field)) => {
                Self::missing_required_field(field, request_id)
            }
            _ => Self::invalid_json(reason, request_id),
        }
    }
}

/// Extract `x` from serde's "missing field `x`" message.
fn missing_field_name(message: &str) -> Option<String> {
    let rest = &message[message.find("missing field `")? + "missing field `".len()..];
    rest.find('`').map(|end| rest[..end].to_string())
}

impl RuntimeError {
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn kind(&self) -> &RuntimeErrorKind {
        &self.kind
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match &self.kind {
            RuntimeErrorKind::NotFound { .. } => StatusCode::NOT_FOUND,
            RuntimeErrorKind::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            RuntimeErrorKind::MissingRequiredField { .. } => StatusCode::BAD_REQUEST,
            RuntimeErrorKind::DuplicateAssociation { .. } => StatusCode::BAD_REQUEST,
            RuntimeErrorKind::InvalidJson { .. } => StatusCode::BAD_REQUEST,
            RuntimeErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RuntimeErrorKind::RemoteServiceFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RuntimeErrorKind::ToolExecutionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RuntimeErrorKind::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            RuntimeErrorKind::NotFound { .. } => ErrorCode::NotFound,
            RuntimeErrorKind::InvalidInput { .. } => ErrorCode::InvalidInput,
            RuntimeErrorKind::MissingRequiredField { .. } => ErrorCode::MissingRequiredField,
            RuntimeErrorKind::DuplicateAssociation { .. } => ErrorCode::DuplicateAssociation,
            RuntimeErrorKind::InvalidJson { .. } => ErrorCode::InvalidJson,
            RuntimeErrorKind::PayloadTooLarge => ErrorCode::PayloadTooLarge,
            RuntimeErrorKind::RemoteServiceFailure { .. } => ErrorCode::RemoteServiceFailure,
            RuntimeErrorKind::ToolExecutionFailed { .. } => ErrorCode::ToolExecutionFailed,
            RuntimeErrorKind::InternalError { .. } => ErrorCode::InternalError,
        }
    }

    /// Convert this error into a sanitized error response
    ///
    /// Only field names and tool names reach the client. Remote and internal
    /// failure reasons are logged with the request id instead.
    pub fn to_error_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(
            self.error_code().as_str(),
            &self.user_facing_message(),
            self.request_id.clone(),
        );

        match &self.kind {
            RuntimeErrorKind::InvalidInput { field, reason } => {
                response.with_details(serde_json::json!({
                    "field": field,
                    "reason": reason
                }))
            }
            RuntimeErrorKind::MissingRequiredField { field } => {
                response.with_details(serde_json::json!({ "field": field }))
            }
            RuntimeErrorKind::DuplicateAssociation { tool_id, .. } => {
                response.with_details(serde_json::json!({ "toolId": tool_id }))
            }
            RuntimeErrorKind::ToolExecutionFailed { tool_name, .. } => {
                response.with_details(serde_json::json!({ "tool": tool_name }))
            }
            _ => response,
        }
    }

    fn user_facing_message(&self) -> String {
        match &self.kind {
            RuntimeErrorKind::NotFound { resource, .. } => {
                format!("{resource} not found.")
            }
            RuntimeErrorKind::InvalidInput { field, .. } => {
                format!("Invalid value provided for field '{field}'.")
            }
            RuntimeErrorKind::MissingRequiredField { field } => {
                format!("Required field '{field}' is missing.")
            }
            RuntimeErrorKind::DuplicateAssociation { .. } => {
                "Tool is already attached to this agent.".to_string()
            }
            RuntimeErrorKind::InvalidJson { .. } => "Invalid JSON in request body.".to_string(),
            RuntimeErrorKind::PayloadTooLarge => "Request body is too large.".to_string(),
            RuntimeErrorKind::RemoteServiceFailure { operation, .. } => {
                format!("Failed to {operation}.")
            }
            RuntimeErrorKind::ToolExecutionFailed { .. } => {
                "Tool execution failed. Please check your request.".to_string()
            }
            RuntimeErrorKind::InternalError { .. } => {
                "An internal error occurred. Please try again later.".to_string()
            }
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RuntimeErrorKind::NotFound { resource, id } => {
                write!(f, "{resource} not found: {id}")
            }
            RuntimeErrorKind::InvalidInput { field, reason } => {
                write!(f, "Invalid input for {field}: {reason}")
            }
            RuntimeErrorKind::MissingRequiredField { field } => {
                write!(f, "Missing required field: {field}")
            }
            RuntimeErrorKind::DuplicateAssociation { agent_id, tool_id } => {
                write!(f, "Tool {tool_id} already attached to agent {agent_id}")
            }
            RuntimeErrorKind::InvalidJson { reason } => write!(f, "Invalid JSON: {reason}"),
            RuntimeErrorKind::PayloadTooLarge => write!(f, "Payload too large"),
            RuntimeErrorKind::RemoteServiceFailure { operation, reason } => {
                write!(f, "Remote service failure during {operation}: {reason}")
            }
            RuntimeErrorKind::ToolExecutionFailed { tool_name, reason } => {
                write!(f, "Tool execution failed: {tool_name}: {reason}")
            }
            RuntimeErrorKind::InternalError { reason } => {
                write!(f, "Internal server error: {reason}")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

impl IntoResponse for RuntimeError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = self.to_error_response();

        if status_code.is_server_error() {
            tracing::error!(
                error_code = %self.error_code(),
                request_id = %self.request_id(),
                status_code = %status_code,
                error_message = %self,
                "HTTP runtime error occurred"
            );
        } else {
            tracing::warn!(
                error_code = %self.error_code(),
                request_id = %self.request_id(),
                status_code = %status_code,
                error_message = %self,
                "Request rejected"
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for HTTP runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Helper trait for converting library errors to [`RuntimeError`]
pub trait IntoRuntimeError<T> {
    fn into_runtime_error(self, request_id: &RequestId) -> RuntimeResult<T>;
}

impl<T> IntoRuntimeError<T> for Result<T, CoreError> {
    fn into_runtime_error(self, request_id: &RequestId) -> RuntimeResult<T> {
        self.map_err(|e| RuntimeError::from_core(e, request_id.clone()))
    }
}
