//! Transcript Model
//!
//! What the player sees: an append-only sequence of messages. Entries are
//! never edited after they are pushed; a streamed narrative turn is
//! accumulated in a [`NarrationBuffer`] and appended once, when it completes.

use chrono::{DateTime, Utc};

use crate::error::ClientError;
use crate::streaming::StreamObserver;

/// Who a transcript line comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Narrator output and status lines
    System,
    /// Player input
    User,
    /// Failure reported to the player
    Error,
}

/// One transcript line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Display text
    pub content: String,
    /// Origin of the line
    pub kind: MessageKind,
    /// When the line was appended
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped now
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered, append-only message log
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return it
    pub fn push(&mut self, kind: MessageKind, content: impl Into<String>) -> &Message {
        self.messages.push(Message::new(kind, content));
        // Just pushed
        &self.messages[self.messages.len() - 1]
    }

    /// Append narrator output
    pub fn push_system(&mut self, content: impl Into<String>) -> &Message {
        self.push(MessageKind::System, content)
    }

    /// Append player input
    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(MessageKind::User, content)
    }

    /// Append a failure, rendered for the player
    pub fn push_error(&mut self, error: &ClientError) -> &Message {
        self.push(MessageKind::Error, error.user_message())
    }

    /// All messages, oldest first
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been appended yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Stream observer that assembles one narrative turn into a transcript
///
/// Fragments are concatenated in arrival order. On completion the full text
/// becomes one `System` message; on error the error becomes one `Error`
/// message. Text received before an error is discarded.
#[derive(Debug)]
pub struct NarrationBuffer<'a> {
    transcript: &'a mut Transcript,
    pending: String,
}

impl<'a> NarrationBuffer<'a> {
    /// Buffer that appends into `transcript`
    pub fn new(transcript: &'a mut Transcript) -> Self {
        Self {
            transcript,
            pending: String::new(),
        }
    }

    /// Text received so far for the current turn
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }
}

impl StreamObserver for NarrationBuffer<'_> {
    fn on_fragment(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    fn on_complete(&mut self) {
        let text = std::mem::take(&mut self.pending);
        self.transcript.push_system(text);
    }

    fn on_error(&mut self, error: &ClientError) {
        self.pending.clear();
        self.transcript.push_error(error);
    }
}
