//! HTTP Event Transport
//!
//! Opens `text/event-stream` responses with `reqwest` and decodes them with
//! [`SseStream`]. Stream requests use a client without a total timeout: an
//! open stream may stay quiet for as long as the backend needs.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};

use crate::config::ClientConfig;
use crate::messages::SESSION_HEADER;
use crate::sse::SseStream;
use crate::transport::traits::{
    EventStream, EventTransport, StreamKind, StreamRequest, TransportError,
};

/// Event transport over HTTP
#[derive(Clone, Debug)]
pub struct HttpEventTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpEventTransport {
    /// Create a transport for `base_url`
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for streams");
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Create a transport from client configuration
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url(), config.retry_policy().connect_timeout)
    }

    /// Base URL this transport talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, kind: &StreamKind) -> String {
        match kind {
            StreamKind::Adventure => format!("{}/stream-adventure", self.base_url),
            StreamKind::Action(_) => format!("{}/stream-action", self.base_url),
        }
    }
}

#[async_trait]
impl EventTransport for HttpEventTransport {
    async fn open(&self, request: &StreamRequest) -> Result<EventStream, TransportError> {
        let mut builder = self
            .http
            .get(self.endpoint(&request.kind))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");

        if let StreamKind::Action(ref action) = request.kind {
            builder = builder.query(&[("action", action.as_str())]);
        }
        if let Some(ref session_id) = request.session_id {
            builder = builder.header(SESSION_HEADER, session_id.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(kind = %request.kind, status = status.as_u16(), "Event stream opened");

        let bytes = Box::pin(response.bytes_stream());
        let events = SseStream::new(bytes)
            .map(|item| item.map_err(|e| TransportError::ReadFailed(e.to_string())));

        Ok(Box::pin(events))
    }
}
