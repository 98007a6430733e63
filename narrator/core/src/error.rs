//! Client Errors
//!
//! One failure taxonomy shared by the one-shot session calls and the
//! streaming controller. Callers can tell "the server could not be reached"
//! apart from "the server answered with an application-level failure", and
//! every variant renders to a single line suitable for a transcript.

use thiserror::Error;

/// Result alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the session client and the stream controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The transport could not reach the server (refused, DNS, reset)
    #[error("unable to connect to the server")]
    Connection,

    /// A one-shot request exceeded its timeout
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// The server was reached but reported a failure
    #[error("{message}")]
    Server {
        /// HTTP status, when the failure came with one
        status: Option<u16>,
        /// Server-supplied error text, or the generic status text
        message: String,
    },

    /// The response body could not be decoded
    #[error("malformed server response: {0}")]
    Decode(String),

    /// The stream never opened; retries were exhausted
    #[error("failed to connect to stream after {attempts} attempts: {reason}")]
    StreamConnect {
        /// Number of connection attempts made
        attempts: u32,
        /// Last failure observed while connecting
        reason: String,
    },

    /// The stream failed after it was open (no retry)
    #[error("stream error: {0}")]
    StreamRuntime(String),

    /// The request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Build a server error from an HTTP status with no usable body
    pub fn from_status(status: u16) -> Self {
        Self::Server {
            status: Some(status),
            message: format!("request failed with status code {status}"),
        }
    }

    /// Whether the server could not be reached at all
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection | Self::Timeout { .. })
    }

    /// Whether this error came from a stream rather than a one-shot call
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::StreamConnect { .. } | Self::StreamRuntime(_))
    }

    /// Single human-readable line for the transcript
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection => {
                "Error: unable to connect to the server. Please check that the backend is running."
                    .to_string()
            }
            other => format!("Error: {other}"),
        }
    }

    /// Classify a transport-level failure from `reqwest`
    ///
    /// `timeout_ms` is the timeout the request was sent with; reqwest does
    /// not carry it on the error.
    pub fn from_transport(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_connect() {
            Self::Connection
        } else if err.is_timeout() {
            Self::Timeout { timeout_ms }
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else {
            // Request/body errors without a response: the server went away
            Self::Connection
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
