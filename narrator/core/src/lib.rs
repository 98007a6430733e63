//! Narrator Core - Client Core for a Server-Narrated Text Adventure
//!
//! This crate talks to the adventure backend on behalf of a front end. It
//! holds no rendering code: a terminal, a desktop window or a test harness
//! drives it the same way.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        UI Consumer                            │
//! │        (narrator CLI, tests, any other front end)             │
//! └───────────────┬──────────────────────────────┬───────────────┘
//!                 │ one-shot calls               │ streamed turns
//!                 ▼                              ▼
//! ┌──────────────────────────┐    ┌──────────────────────────────┐
//! │      SessionClient       │◄───│       StreamController       │
//! │ configure / start /      │    │ start_adventure /            │
//! │ send_action / health /   │    │ submit_action → StreamHandle │
//! │ game_state               │    │ retry + connect timeout      │
//! │ session id (RwLock)      │    └──────────────┬───────────────┘
//! └────────────┬─────────────┘                   │ EventTransport
//!              │ reqwest                         ▼
//!              │                  ┌──────────────────────────────┐
//!              │                  │ HttpEventTransport + SseStream│
//!              │                  └──────────────┬───────────────┘
//!              ▼                                 ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adventure backend                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`SessionClient`]: one-shot calls and session correlation
//! - [`StreamController`]: owns at most one live narrative stream
//! - [`StreamHandle`]: ordered [`StreamEvent`]s for one stream, cancellable
//! - [`ClientConfig`]: API and stream settings from file, env and flags
//! - [`Transcript`]: append-only message log for the player
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use narrator_core::{
//!     load_config, AdventureSettings, ConfigOverrides, NarrationBuffer, SessionClient,
//!     StreamController, Transcript,
//! };
//!
//! let (config, _source) = load_config(None, &ConfigOverrides::default()).await?;
//! let session = Arc::new(SessionClient::from_config(&config));
//! let mut streams = StreamController::from_config(&config, Arc::clone(&session));
//! let mut transcript = Transcript::new();
//!
//! let mut handle = streams.start_adventure(&AdventureSettings::default()).await;
//! handle.drive(&mut NarrationBuffer::new(&mut transcript)).await;
//!
//! transcript.push_user("open the door");
//! let reply = session.send_action("open the door").await?;
//! transcript.push_system(reply);
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod messages;
pub mod retry;
pub mod session;
pub mod sse;
pub mod streaming;
pub mod transcript;
pub mod transport;

pub use config::{
    default_config_path, load_config, load_config_from_path, ApiConfig, ClientConfig,
    ConfigError, ConfigOverrides, ConfigSource, StreamConfig,
};
pub use error::{ClientError, Result};
pub use messages::{
    Ack, ActionRequest, AdventureSettings, ApiEnvelope, GameState, NarrativePayload, SessionId,
    ThemePreset, SESSION_HEADER,
};
pub use retry::RetryPolicy;
pub use session::SessionClient;
pub use sse::{SseEvent, SseStream};
pub use streaming::{StreamController, StreamEvent, StreamHandle, StreamObserver, StreamOutcome};
pub use transcript::{Message, MessageKind, NarrationBuffer, Transcript};
pub use transport::{EventTransport, HttpEventTransport, StreamKind, StreamRequest, TransportError};
