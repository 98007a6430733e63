//! Streaming Narrative
//!
//! The streaming variants of "start adventure" and "submit action". The
//! server pushes narrative text as it is generated; the consumer sees it as
//! ordered [`StreamEvent`]s on a [`StreamHandle`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      StreamController                         │
//! │   start_adventure ──► configure ──┐                           │
//! │   submit_action ──────────────────┼──► teardown previous      │
//! │                                   │            │              │
//! │                                   ▼            ▼              │
//! │                     ┌──────────── StreamRun task ──────────┐  │
//! │                     │ Connecting ──(open)──► Open ──► end  │  │
//! │                     │   ▲   │ fail/timeout                 │  │
//! │                     │   └───┘ backoff                      │  │
//! │                     └──────────────┬───────────────────────┘  │
//! └────────────────────────────────────┼──────────────────────────┘
//!                                      │ mpsc
//!                                      ▼
//!                    StreamHandle ──► StreamObserver
//! ```
//!
//! # Guarantees
//!
//! - At most one live stream per controller; a new stream closes the old
//!   one before opening
//! - At most one terminal event (`Complete` or `Error`) per stream
//! - Nothing is delivered after `cancel`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use narrator_core::{ClientConfig, SessionClient, StreamController, StreamEvent};
//!
//! let config = ClientConfig::default();
//! let session = Arc::new(SessionClient::from_config(&config));
//! let mut streams = StreamController::from_config(&config, session);
//!
//! let mut handle = streams.submit_action("open the door").await;
//! while let Some(event) = handle.next_event().await {
//!     if let StreamEvent::Fragment(text) = event {
//!         print!("{text}");
//!     }
//! }
//! ```

mod controller;
mod handle;

pub use controller::StreamController;
pub use handle::{StreamEvent, StreamHandle, StreamObserver, StreamOutcome};
