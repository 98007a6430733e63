//! Stream Controller
//!
//! Owns at most one live stream. Each stream runs as one spawned task that
//! walks `Connecting → Open → finished`:
//!
//! - **Connecting**: every attempt is bounded by the connect timeout; a
//!   failed attempt is retried after `attempt × interval` until the attempt
//!   budget is spent, then a single `StreamConnect` error is delivered.
//! - **Open**: `message` events are forwarded as fragments; `done` completes
//!   the stream; a server `error` event, a read failure or an early end of
//!   stream delivers a single `StreamRuntime` error. There is no retry once
//!   the stream is open.
//!
//! Starting a stream tears down the previous one first and waits for its
//! transport to close before the new one opens.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::messages::AdventureSettings;
use crate::retry::RetryPolicy;
use crate::session::SessionClient;
use crate::streaming::handle::{CancelFlag, StreamEvent, StreamHandle};
use crate::transport::{EventStream, EventTransport, HttpEventTransport, StreamRequest};

/// Server event names
const EVENT_CONNECTED: &str = "connected";
const EVENT_MESSAGE: &str = "message";
const EVENT_ERROR: &str = "error";
const EVENT_DONE: &str = "done";

/// Events buffered between the stream task and the handle
const EVENT_BUFFER: usize = 64;

// ============================================================================
// Controller
// ============================================================================

struct ActiveStream {
    id: u64,
    cancelled: CancelFlag,
    task: JoinHandle<()>,
}

/// Drives the streaming variants of the adventure calls
pub struct StreamController<T: EventTransport = HttpEventTransport> {
    session: Arc<SessionClient>,
    transport: Arc<T>,
    policy: RetryPolicy,
    active: Option<ActiveStream>,
    next_id: u64,
}

impl StreamController<HttpEventTransport> {
    /// Controller over HTTP, sharing `session` with one-shot calls
    #[must_use]
    pub fn from_config(config: &ClientConfig, session: Arc<SessionClient>) -> Self {
        Self::new(
            session,
            HttpEventTransport::from_config(config),
            config.retry_policy(),
        )
    }
}

impl<T: EventTransport> StreamController<T> {
    /// Create a controller over an arbitrary transport
    pub fn new(session: Arc<SessionClient>, transport: T, policy: RetryPolicy) -> Self {
        Self {
            session,
            transport: Arc::new(transport),
            policy,
            active: None,
            next_id: 0,
        }
    }

    /// The session client whose session the streams correlate with
    #[must_use]
    pub fn session(&self) -> &Arc<SessionClient> {
        &self.session
    }

    /// The reconnect policy in use
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Whether a stream task is still running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }

    /// Configure the adventure, then stream its opening narrative
    ///
    /// A configuration failure is delivered as the handle's only event.
    pub async fn start_adventure(&mut self, settings: &AdventureSettings) -> StreamHandle {
        self.teardown().await;
        let id = self.next_stream_id();

        if let Err(e) = self.session.configure(settings).await {
            tracing::warn!(stream_id = id, error = %e, "Configure failed; stream not opened");
            return StreamHandle::failed(id, e);
        }

        let request = StreamRequest::adventure(self.session.session_id());
        self.spawn(id, request)
    }

    /// Stream the narrative continuation for a player action
    pub async fn submit_action(&mut self, action: &str) -> StreamHandle {
        self.teardown().await;
        let id = self.next_stream_id();

        let request = StreamRequest::action(action, self.session.session_id());
        self.spawn(id, request)
    }

    /// Tear down the active stream, if any
    ///
    /// Its handle yields no further events.
    pub async fn cancel(&mut self) {
        self.teardown().await;
    }

    fn next_stream_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    async fn teardown(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.cancelled.store(true, Ordering::SeqCst);
        active.task.abort();
        // Wait for the task (and its transport) to be dropped
        if let Err(e) = active.task.await {
            if !e.is_cancelled() {
                tracing::warn!(stream_id = active.id, error = %e, "Stream task failed");
            }
        }
        tracing::debug!(stream_id = active.id, "Stream torn down");
    }

    fn spawn(&mut self, id: u64, request: StreamRequest) -> StreamHandle {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let cancelled: CancelFlag = Arc::new(AtomicBool::new(false));

        let run = StreamRun {
            id,
            request,
            transport: Arc::clone(&self.transport),
            policy: self.policy,
            cancelled: Arc::clone(&cancelled),
            events: tx,
        };
        let task = tokio::spawn(run.execute());
        let handle = StreamHandle::new(id, rx, Arc::clone(&cancelled), task.abort_handle());

        self.active = Some(ActiveStream {
            id,
            cancelled,
            task,
        });
        handle
    }
}

impl<T: EventTransport> Drop for StreamController<T> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancelled.store(true, Ordering::SeqCst);
            active.task.abort();
        }
    }
}

// ============================================================================
// Stream Task
// ============================================================================

struct StreamRun<T: EventTransport> {
    id: u64,
    request: StreamRequest,
    transport: Arc<T>,
    policy: RetryPolicy,
    cancelled: CancelFlag,
    events: mpsc::Sender<StreamEvent>,
}

impl<T: EventTransport> StreamRun<T> {
    async fn execute(self) {
        let Some(mut stream) = self.connect().await else {
            return;
        };
        self.pump(&mut stream).await;
        tracing::debug!(stream_id = self.id, "Stream closed");
    }

    /// Connecting phase; `None` when attempts ran out or the stream was cancelled
    async fn connect(&self) -> Option<EventStream> {
        let timeout = self.policy.connect_timeout;
        let mut failures: u32 = 0;

        loop {
            let attempt = failures + 1;
            tracing::debug!(
                stream_id = self.id,
                kind = %self.request.kind,
                attempt,
                "Opening stream"
            );

            let reason = match tokio::time::timeout(timeout, self.transport.open(&self.request)).await
            {
                Ok(Ok(stream)) => {
                    tracing::info!(stream_id = self.id, attempt, "Stream open");
                    return Some(stream);
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("connection timed out after {}ms", timeout.as_millis()),
            };

            failures += 1;
            if !self.policy.should_retry(failures) {
                tracing::warn!(
                    stream_id = self.id,
                    attempts = failures,
                    reason = %reason,
                    "Stream connect attempts exhausted"
                );
                self.emit(StreamEvent::Error(ClientError::StreamConnect {
                    attempts: failures,
                    reason,
                }))
                .await;
                return None;
            }

            let delay = self.policy.delay_for_attempt(failures);
            tracing::warn!(
                stream_id = self.id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %reason,
                "Stream connect failed, retrying"
            );
            tokio::time::sleep(delay).await;

            if self.is_cancelled() {
                return None;
            }
        }
    }

    /// Open phase: dispatch events until a terminal one
    async fn pump(&self, stream: &mut EventStream) {
        while let Some(item) = stream.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(stream_id = self.id, error = %e, "Stream read failed");
                    self.emit(StreamEvent::Error(ClientError::StreamRuntime(e.to_string())))
                        .await;
                    return;
                }
            };

            match event.event.as_str() {
                EVENT_CONNECTED => {
                    if !self.emit(StreamEvent::Connected).await {
                        return;
                    }
                }
                EVENT_MESSAGE => {
                    if !self.emit(StreamEvent::Fragment(event.data)).await {
                        return;
                    }
                }
                EVENT_DONE => {
                    tracing::debug!(stream_id = self.id, "Stream done");
                    self.emit(StreamEvent::Complete).await;
                    return;
                }
                EVENT_ERROR => {
                    let message = server_error_text(&event.data);
                    tracing::warn!(stream_id = self.id, error = %message, "Server pushed stream error");
                    self.emit(StreamEvent::Error(ClientError::StreamRuntime(message)))
                        .await;
                    return;
                }
                other => {
                    tracing::debug!(stream_id = self.id, event = other, "Ignoring unknown stream event");
                }
            }
        }

        tracing::warn!(stream_id = self.id, "Stream ended without done");
        self.emit(StreamEvent::Error(ClientError::StreamRuntime(
            "stream ended before completion".to_string(),
        )))
        .await;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Deliver an event; `false` when the consumer is gone or cancelled
    async fn emit(&self, event: StreamEvent) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.events.send(event).await.is_ok()
    }
}

#[derive(Deserialize)]
struct ErrorData {
    error: String,
}

/// Text of a server `error` event: plain data, or `{"error": "..."}`
fn server_error_text(data: &str) -> String {
    let data = data.trim();
    if data.is_empty() {
        return "server reported a stream error".to_string();
    }
    match serde_json::from_str::<ErrorData>(data) {
        Ok(body) if !body.error.is_empty() => body.error,
        _ => data.to_string(),
    }
}
