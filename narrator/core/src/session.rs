//! Session Client
//!
//! One-shot request/response calls against the adventure backend:
//! configure an adventure, start it, send player actions, probe health and
//! read the server's game state.
//!
//! # Session correlation
//!
//! The server issues an opaque session identifier in the `x-session-id`
//! response header (older backends echo it as `sessionId` in the payload).
//! Once issued it is attached to every later request until `configure`
//! starts a new session. The identifier lives on the client instance, never
//! in process-wide state, so independent clients never share a session.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::messages::{
    Ack, ActionRequest, AdventureSettings, ApiEnvelope, GameState, NarrativePayload, SessionId,
    SESSION_HEADER,
};

/// Payload returned by a call, plus whether the response carried a session header
struct Reply<T> {
    data: Option<T>,
    header_session: bool,
}

/// Error body of a failed request; `data` may not match the success shape
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Client for the one-shot adventure endpoints
#[derive(Debug)]
pub struct SessionClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
    session_id: RwLock<Option<SessionId>>,
}

impl SessionClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            timeout,
            session_id: RwLock::new(None),
        }
    }

    /// Create a client from configuration
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url(), config.request_timeout())
    }

    /// Base URL of the backend
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current session, if the server has issued one
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id.read().clone()
    }

    /// Whether a session is active
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session_id.read().is_some()
    }

    /// Forget the current session
    pub fn clear_session(&self) {
        if self.session_id.write().take().is_some() {
            tracing::debug!("Session cleared");
        }
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Configure a new adventure
    ///
    /// Clears any existing session first; the server issues a fresh one.
    pub async fn configure(&self, settings: &AdventureSettings) -> Result<Ack> {
        self.clear_session();

        let builder = self
            .request(Method::POST, "set-adventure-settings")
            .json(settings);
        let reply = self.execute::<NarrativePayload>(builder).await?;
        let message = self.adopt_payload(reply).unwrap_or_default();

        let ack = Ack {
            message,
            session_id: self.session_id(),
        };
        tracing::info!(session = ?ack.session_id, "Adventure configured");
        Ok(ack)
    }

    /// Start the configured adventure and return its opening narrative
    ///
    /// Ordering after [`configure`](Self::configure) is the caller's job.
    pub async fn start(&self, settings: &AdventureSettings) -> Result<String> {
        let builder = self.request(Method::POST, "start-adventure").json(settings);
        let reply = self.execute::<NarrativePayload>(builder).await?;
        Ok(self.adopt_payload(reply).unwrap_or_default())
    }

    /// Send a player action and return the narrative continuation
    pub async fn send_action(&self, action: &str) -> Result<String> {
        let builder = self
            .request(Method::POST, "action")
            .json(&ActionRequest::new(action));
        let reply = self.execute::<NarrativePayload>(builder).await?;
        Ok(self.adopt_payload(reply).unwrap_or_default())
    }

    /// Liveness probe; independent of session state
    pub async fn check_health(&self) -> Result<String> {
        let builder = self.request(Method::GET, "health");
        let reply = self.execute::<NarrativePayload>(builder).await?;
        Ok(reply.data.map(NarrativePayload::into_text).unwrap_or_default())
    }

    /// Server-side game state for the current session
    ///
    /// `Ok(None)` when no session is active; nothing is sent in that case.
    pub async fn game_state(&self) -> Result<Option<GameState>> {
        let Some(session_id) = self.session_id() else {
            return Ok(None);
        };

        let path = format!("game-state/{session_id}");
        let builder = self.request(Method::GET, &path);
        let reply = self.execute::<GameState>(builder).await?;
        Ok(Some(reply.data.unwrap_or_default()))
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.session_id() {
            Some(id) => builder.header(SESSION_HEADER, id.as_str()),
            None => builder,
        }
    }

    /// Record a session issued in response headers; returns whether one was present
    fn capture_session(&self, headers: &HeaderMap) -> bool {
        let Some(id) = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
        else {
            return false;
        };

        let id = SessionId::new(id);
        let mut current = self.session_id.write();
        if current.as_ref() != Some(&id) {
            tracing::debug!(session = %id, "Session issued");
            *current = Some(id);
        }
        true
    }

    /// Take the narrative text, adopting a body-level session id when the
    /// response carried no header
    fn adopt_payload(&self, reply: Reply<NarrativePayload>) -> Option<String> {
        let payload = reply.data?;
        if !reply.header_session {
            if let Some(id) = payload.session_id() {
                tracing::debug!(session = %id, "Session issued in payload");
                *self.session_id.write() = Some(id);
            }
        }
        Some(payload.into_text())
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Reply<T>> {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Request failed before a response");
            ClientError::from_transport(&e, timeout_ms)
        })?;

        let header_session = self.capture_session(response.headers());
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_transport(&e, timeout_ms))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty());
            tracing::warn!(status = status.as_u16(), error = ?message, "Server returned an error status");
            return Err(match message {
                Some(message) => ClientError::Server {
                    status: Some(status.as_u16()),
                    message,
                },
                None => ClientError::from_status(status.as_u16()),
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        if !envelope.success {
            let message = envelope
                .error
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "server reported a failure".to_string());
            tracing::warn!(error = %message, "Server reported failure");
            return Err(ClientError::Server {
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(Reply {
            data: envelope.data,
            header_session,
        })
    }
}
