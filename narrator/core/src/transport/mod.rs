//! Transport Layer for Streaming
//!
//! Separates "how a stream is opened" from the stream controller's state
//! machine:
//! - [`EventTransport`]: the seam the controller depends on
//! - [`HttpEventTransport`]: `reqwest` + SSE decoding against the backend
//!
//! Dropping an [`EventStream`] closes the underlying connection.

pub mod http;
pub mod traits;

pub use http::HttpEventTransport;
pub use traits::{EventStream, EventTransport, StreamKind, StreamRequest, TransportError};
