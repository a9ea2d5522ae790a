//! HTTP client for the remote agent-hosting service.
//!
//! [`HttpAgentGateway`] implements [`AgentGateway`] over a small REST
//! surface:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | create | `POST /agents` |
//! | update | `PATCH /agents/{id}` |
//! | delete | `DELETE /agents/{id}` |
//! | get | `GET /agents/{id}` |
//! | list | `GET /agents?maxResults=&nextToken=` |
//! | prepare | `POST /agents/{id}/prepare` |
//! | invoke | `POST /agents/{id}/aliases/{alias}/sessions/{session}/invoke` |
//!
//! Invocation responses are Server-Sent Events whose `data:` lines carry
//! `{"type":"chunk","data":"..."}` objects.
//!
//! # Timeouts
//!
//! | Operation | Default Timeout |
//! |-----------|-----------------|
//! | Regular requests | 30 seconds |
//! | Invocation streams | 5 minutes |
//!
//! # Retry Policy
//!
//! The client does **not** retry. [`GatewayError::is_retryable`] classifies
//! failures for callers that want to.
//!
//! # Error Mapping
//!
//! | Status | Error |
//! |--------|-------|
//! | 400, 422 | `Rejected` |
//! | 401, 403 | `AuthenticationFailed` |
//! | 404 | `NotFound` |
//! | 429 | `Throttled` |
//! | other | `Service` |

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{AgentGateway, ChunkStream};
use crate::types::{
    AgentDefinition, AgentPage, InvocationChunk, InvokeBody, InvokeRequest, Preparation,
    RemoteAgent, RemoteEvent,
};

/// Default timeout for HTTP requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for invocation streams
pub const STREAMING_TIMEOUT: Duration = Duration::from_secs(300);

/// Fallback when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Authentication applied to every request
#[derive(Clone)]
pub enum AuthConfig {
    /// Bearer token authentication
    Bearer(String),
    /// API key in header
    ApiKeyHeader { name: String, value: String },
}

/// REST client for the agent-hosting service
#[derive(Clone)]
pub struct HttpAgentGateway {
    base_url: Url,
    http: Client,
    auth: Option<AuthConfig>,
    timeout: Duration,
    streaming_timeout: Duration,
}

impl std::fmt::Debug for HttpAgentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAgentGateway")
            .field("base_url", &self.base_url.as_str())
            .field("has_auth", &self.auth.is_some())
            .finish()
    }
}

impl HttpAgentGateway {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: impl AsRef<str>) -> GatewayResult<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(format!("agentdeck/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::connection(format!("Failed to create HTTP client: {e}")))?;
        Self::with_http_client(base_url, http)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_http_client(base_url: impl AsRef<str>, http: Client) -> GatewayResult<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::protocol(format!(
                "Base URL cannot carry a path: {base_url}"
            )));
        }
        Ok(Self {
            base_url,
            http,
            auth: None,
            timeout: DEFAULT_TIMEOUT,
            streaming_timeout: STREAMING_TIMEOUT,
        })
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_bearer_token(self, token: impl Into<String>) -> Self {
        self.with_auth(AuthConfig::Bearer(token.into()))
    }

    pub fn with_api_key(self, header_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.with_auth(AuthConfig::ApiKeyHeader {
            name: header_name.into(),
            value: api_key.into(),
        })
    }

    /// Override the timeout of regular requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the timeout of invocation streams
    pub fn with_streaming_timeout(mut self, timeout: Duration) -> Self {
        self.streaming_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a URL from percent-encoded path segments below the base URL.
    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::protocol(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(AuthConfig::Bearer(token)) => builder.bearer_auth(token),
            Some(AuthConfig::ApiKeyHeader { name, value }) => builder.header(name.as_str(), value),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body, mapping failures to typed errors.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> GatewayResult<T> {
        let response = self.send(builder, context).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::protocol(format!("Failed to parse {context} response: {e}")))
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> GatewayResult<reqwest::Response> {
        let response = self
            .apply_auth(builder.timeout(self.timeout))
            .send()
            .await
            .map_err(|e| {
                GatewayError::from_transport(e, context, self.timeout.as_millis() as u64)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_response(status, response, context).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    fn describe(&self) -> String {
        self.base_url.to_string()
    }

    async fn create_agent(&self, definition: &AgentDefinition) -> GatewayResult<RemoteAgent> {
        let url = self.endpoint(&["agents"])?;
        debug!(url = %url, agent_name = %definition.agent_name, "Creating remote agent");

        let agent: RemoteAgent = self
            .execute(self.http.post(url).json(definition), "create agent")
            .await?;

        info!(
            agent_id = %agent.agent_id,
            status = %agent.agent_status,
            "Remote agent created"
        );
        Ok(agent)
    }

    async fn update_agent(
        &self,
        agent_id: &str,
        definition: &AgentDefinition,
    ) -> GatewayResult<RemoteAgent> {
        let url = self.endpoint(&["agents", agent_id])?;
        debug!(agent_id = %agent_id, "Updating remote agent");
        self.execute(self.http.patch(url).json(definition), "update agent")
            .await
    }

    async fn delete_agent(&self, agent_id: &str) -> GatewayResult<()> {
        let url = self.endpoint(&["agents", agent_id])?;
        debug!(agent_id = %agent_id, "Deleting remote agent");
        self.send(self.http.delete(url), "delete agent").await?;
        info!(agent_id = %agent_id, "Remote agent deleted");
        Ok(())
    }

    async fn get_agent(&self, agent_id: &str) -> GatewayResult<RemoteAgent> {
        let url = self.endpoint(&["agents", agent_id])?;
        self.execute(self.http.get(url), "get agent").await
    }

    async fn list_agents(
        &self,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> GatewayResult<AgentPage> {
        let mut url = self.endpoint(&["agents"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(size) = page_size {
                query.append_pair("maxResults", &size.to_string());
            }
            if let Some(token) = page_token {
                query.append_pair("nextToken", token);
            }
        }
        // An empty query leaves a dangling '?'
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.execute(self.http.get(url), "list agents").await
    }

    async fn prepare_agent(&self, agent_id: &str) -> GatewayResult<Preparation> {
        let url = self.endpoint(&["agents", agent_id, "prepare"])?;
        debug!(agent_id = %agent_id, "Preparing remote agent");
        let preparation: Preparation = self
            .execute(self.http.post(url), "prepare agent")
            .await?;
        info!(
            agent_id = %agent_id,
            status = %preparation.agent_status,
            "Remote agent prepared"
        );
        Ok(preparation)
    }

    async fn invoke_agent_stream(&self, request: InvokeRequest) -> GatewayResult<ChunkStream> {
        let url = self.endpoint(&[
            "agents",
            &request.agent_id,
            "aliases",
            &request.agent_alias_id,
            "sessions",
            &request.session_id,
            "invoke",
        ])?;

        debug!(
            agent_id = %request.agent_id,
            session_id = %request.session_id,
            "Invoking remote agent"
        );

        let builder = self
            .http
            .post(url)
            .timeout(self.streaming_timeout)
            .header("Accept", "text/event-stream")
            .json(&InvokeBody {
                input_text: &request.input_text,
            });
        let response = self
            .apply_auth(builder)
            .send()
            .await
            .map_err(|e| {
                GatewayError::from_transport(
                    e,
                    "invoke agent",
                    self.streaming_timeout.as_millis() as u64,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_response(status, response, "invoke agent").await);
        }

        Ok(Box::pin(sse_chunks(response)))
    }
}

/// Turn an event-stream response into invocation chunks.
///
/// The stream is polled by the consumer; dropping it drops the response
/// and closes the connection.
fn sse_chunks(
    response: reqwest::Response,
) -> impl futures::Stream<Item = GatewayResult<InvocationChunk>> + Send {
    async_stream::stream! {
        let mut bytes = response.bytes_stream();
        let mut decoder = Utf8Decoder::default();
        let mut buffer = String::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(GatewayError::connection(format!("Stream error: {e}")));
                    return;
                }
            };
            decoder.push(&chunk, &mut buffer);

            while let Some(event) = parse_sse_event(&mut buffer) {
                let failed = event.is_err();
                yield event;
                if failed {
                    return;
                }
            }
        }

        // A final event without the trailing blank line
        buffer.push_str("\n\n");
        if let Some(event) = parse_sse_event(&mut buffer) {
            yield event;
        }
    }
}

/// Incremental UTF-8 decoding that tolerates characters and CRLF line
/// endings split across chunks
#[derive(Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
    /// A `\r` ended the last chunk; held until the next byte is known
    trailing_cr: bool,
}

impl Utf8Decoder {
    fn push(&mut self, bytes: &[u8], out: &mut String) {
        self.pending.extend_from_slice(bytes);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    Self::normalize(&mut self.trailing_cr, text, out);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending[..valid]) {
                        Self::normalize(&mut self.trailing_cr, text, out);
                    }
                    match e.error_len() {
                        // Incomplete sequence at the end; wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(len) => {
                            warn!("Invalid UTF-8 in invocation stream");
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }

    /// Append `text` to `out` with CRLF folded to LF.
    fn normalize(trailing_cr: &mut bool, text: &str, out: &mut String) {
        if text.is_empty() {
            return;
        }
        if std::mem::take(trailing_cr) && !text.starts_with('\n') {
            out.push('\r');
        }
        let text = match text.strip_suffix('\r') {
            Some(head) => {
                *trailing_cr = true;
                head
            }
            None => text,
        };
        out.push_str(&text.replace("\r\n", "\n"));
    }
}

/// Parse the next complete SSE event from `buffer`.
///
/// Returns `None` until a full event (terminated by a blank line) carrying
/// a chunk is available. Events without data and informational events are
/// consumed and skipped.
fn parse_sse_event(buffer: &mut String) -> Option<GatewayResult<InvocationChunk>> {
    loop {
        let event_end = buffer.find("\n\n")?;
        let event_str: String = buffer.drain(..event_end + 2).collect();

        let mut data = String::new();
        for line in event_str.lines() {
            if let Some(value) = line.strip_prefix("data:") {
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(value.strip_prefix(' ').unwrap_or(value));
            }
        }

        if data.is_empty() {
            continue;
        }

        match serde_json::from_str::<RemoteEvent>(&data) {
            Ok(RemoteEvent::Chunk { data }) => return Some(Ok(InvocationChunk { data })),
            Ok(RemoteEvent::Error { message }) => return Some(Err(GatewayError::stream(message))),
            Ok(RemoteEvent::Other) => continue,
            Err(e) => {
                warn!(error = %e, "Failed to parse invocation event");
                return Some(Err(GatewayError::protocol(format!(
                    "Failed to parse invocation event: {e}"
                ))));
            }
        }
    }
}

/// Map a non-success response to a typed error
async fn handle_error_response(
    status: StatusCode,
    response: reqwest::Response,
    context: &str,
) -> GatewayError {
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let error_text = response.text().await.unwrap_or_default();

    warn!(
        status = %status,
        context = %context,
        "Remote agent service returned an error"
    );

    match status {
        StatusCode::NOT_FOUND => GatewayError::NotFound {
            resource: format!("{context}: {error_text}"),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => GatewayError::Rejected {
            reason: error_text,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::AuthenticationFailed {
            reason: error_text,
        },
        StatusCode::TOO_MANY_REQUESTS => GatewayError::Throttled {
            retry_after_seconds: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        _ => GatewayError::Service {
            status: status.as_u16(),
            message: error_text,
        },
    }
}
