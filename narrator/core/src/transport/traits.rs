//! Event Transport Traits
//!
//! The stream controller only needs one capability from the network: open an
//! event stream for a request and hand back the events as they arrive.
//! Keeping that behind a trait lets the controller's state machine run
//! against the HTTP transport in production and a scripted one in tests.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use crate::messages::SessionId;
use crate::sse::SseEvent;

/// Transport-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not establish the connection
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The server answered, but not with an event stream
    #[error("server rejected stream with status {status}: {message}")]
    Rejected {
        /// HTTP status
        status: u16,
        /// Body or reason text
        message: String,
    },

    /// The open stream failed while reading
    #[error("stream read failed: {0}")]
    ReadFailed(String),
}

/// A live event stream; dropping it closes the connection
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SseEvent, TransportError>> + Send>>;

/// Which streaming endpoint to open
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamKind {
    /// Opening narrative for the configured adventure
    Adventure,
    /// Narrative continuation for a player action
    Action(String),
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adventure => write!(f, "adventure"),
            Self::Action(_) => write!(f, "action"),
        }
    }
}

/// Everything needed to open one stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamRequest {
    /// Endpoint variant
    pub kind: StreamKind,
    /// Session to correlate with, if one is active
    pub session_id: Option<SessionId>,
}

impl StreamRequest {
    /// Request for the adventure stream
    #[must_use]
    pub fn adventure(session_id: Option<SessionId>) -> Self {
        Self {
            kind: StreamKind::Adventure,
            session_id,
        }
    }

    /// Request for an action stream
    pub fn action(action: impl Into<String>, session_id: Option<SessionId>) -> Self {
        Self {
            kind: StreamKind::Action(action.into()),
            session_id,
        }
    }
}

/// Opens event streams
///
/// `open` resolves once the transport considers the stream open (for HTTP:
/// response headers received with a success status). The connect timeout is
/// applied by the caller.
#[async_trait]
pub trait EventTransport: Send + Sync + 'static {
    /// Open an event stream for `request`
    async fn open(&self, request: &StreamRequest) -> Result<EventStream, TransportError>;
}
