//! Stream Handle
//!
//! The consumer's side of one stream: ordered events over an mpsc channel
//! plus the ability to cancel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::error::ClientError;

// ============================================================================
// Events
// ============================================================================

/// An event delivered to the consumer of a stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// The server confirmed the stream (informational)
    Connected,
    /// A piece of narrative text, in arrival order
    Fragment(String),
    /// The narrative turn finished
    Complete,
    /// The stream failed; no further events follow
    Error(ClientError),
}

impl StreamEvent {
    /// Whether this event ends the stream
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error(_))
    }
}

/// How a driven stream ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamOutcome {
    /// `Complete` was delivered
    Completed,
    /// `Error` was delivered
    Failed(ClientError),
    /// The stream was cancelled or replaced before a terminal event
    Cancelled,
}

/// Callbacks for [`StreamHandle::drive`]
///
/// Exactly one of `on_complete` / `on_error` is called per stream, unless
/// the stream is cancelled, in which case neither is.
pub trait StreamObserver {
    /// The server confirmed the stream
    fn on_connected(&mut self) {}

    /// A text fragment arrived
    fn on_fragment(&mut self, text: &str);

    /// The narrative turn finished
    fn on_complete(&mut self);

    /// The stream failed
    fn on_error(&mut self, error: &ClientError);
}

// ============================================================================
// Handle
// ============================================================================

/// Shared cancellation flag between a handle, its task and the controller
pub(crate) type CancelFlag = Arc<AtomicBool>;

/// Handle to one stream
///
/// Events arrive in transport order. After a terminal event, or after the
/// stream is cancelled, [`next_event`](Self::next_event) returns `None`.
#[derive(Debug)]
pub struct StreamHandle {
    id: u64,
    events: mpsc::Receiver<StreamEvent>,
    cancelled: CancelFlag,
    task: Option<AbortHandle>,
    finished: bool,
}

impl StreamHandle {
    pub(crate) fn new(
        id: u64,
        events: mpsc::Receiver<StreamEvent>,
        cancelled: CancelFlag,
        task: AbortHandle,
    ) -> Self {
        Self {
            id,
            events,
            cancelled,
            task: Some(task),
            finished: false,
        }
    }

    /// A handle whose only event is `error`; no task runs behind it
    pub(crate) fn failed(id: u64, error: ClientError) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 and a fresh channel: cannot fail
        let _ = tx.try_send(StreamEvent::Error(error));

        Self {
            id,
            events: rx,
            cancelled: Arc::new(AtomicBool::new(false)),
            task: None,
            finished: false,
        }
    }

    /// Identifier used in logs
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the stream was cancelled (directly or by being replaced)
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether a terminal event has been delivered
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next event, or `None` once the stream is over
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.finished || self.is_cancelled() {
            return None;
        }

        let event = self.events.recv().await;

        // Cancellation may have raced the receive
        if self.is_cancelled() {
            return None;
        }

        match event {
            Some(event) => {
                if event.is_terminal() {
                    self.finished = true;
                }
                Some(event)
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Stop the stream
    ///
    /// Closes the transport; no completion or error is delivered afterwards.
    /// Calling this after the stream finished is a no-op.
    pub fn cancel(&mut self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.events.close();
        if !self.finished {
            tracing::debug!(stream_id = self.id, "Stream cancelled");
        }
    }

    /// Feed every event into `observer` until the stream ends
    pub async fn drive<O>(&mut self, observer: &mut O) -> StreamOutcome
    where
        O: StreamObserver + ?Sized,
    {
        while let Some(event) = self.next_event().await {
            match event {
                StreamEvent::Connected => observer.on_connected(),
                StreamEvent::Fragment(text) => observer.on_fragment(&text),
                StreamEvent::Complete => {
                    observer.on_complete();
                    return StreamOutcome::Completed;
                }
                StreamEvent::Error(error) => {
                    observer.on_error(&error);
                    return StreamOutcome::Failed(error);
                }
            }
        }
        StreamOutcome::Cancelled
    }
}
