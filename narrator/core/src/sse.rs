//! Server-Sent Events Decoding
//!
//! Turns a chunked byte stream into assembled SSE events:
//!
//! - Line splitting on `\n` and `\r\n`, buffered as bytes so multi-byte
//!   UTF-8 sequences split across chunks survive
//! - Field parsing (`event:`, `data:`, `id:`, `retry:`, `:` comments)
//! - Event assembly at blank lines (multiple `data:` lines joined with `\n`)
//!
//! The adapter is transport-agnostic; the HTTP transport feeds it
//! `reqwest`'s body stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

/// Event name used when the server does not send an `event:` field
pub const DEFAULT_EVENT: &str = "message";

/// One parsed line of an event stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SseLine {
    /// `data:` payload (single leading space stripped)
    Data(String),
    /// `event:` name
    Event(String),
    /// `id:` value
    Id(String),
    /// `retry:` reconnection hint in milliseconds
    Retry(u64),
    /// Blank line: dispatch the pending event
    Empty,
    /// Comment or unknown field
    Comment(String),
}

/// A complete event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name (`message` when unnamed)
    pub event: String,
    /// Payload; multi-line data joined with `\n`
    pub data: String,
    /// Last event id, if sent
    pub id: Option<String>,
    /// Reconnection hint, if sent
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Build an event with a name and payload
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
            retry: None,
        }
    }
}

fn strip_field<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let value = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// Parse a single line (without its terminator)
#[must_use]
pub fn parse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }
    if let Some(comment) = line.strip_prefix(':') {
        return SseLine::Comment(comment.trim_start().to_string());
    }
    if let Some(data) = strip_field(line, "data") {
        return SseLine::Data(data.to_string());
    }
    if let Some(event) = strip_field(line, "event") {
        return SseLine::Event(event.to_string());
    }
    if let Some(id) = strip_field(line, "id") {
        return SseLine::Id(id.to_string());
    }
    if let Some(retry) = strip_field(line, "retry") {
        if let Ok(ms) = retry.trim().parse() {
            return SseLine::Retry(ms);
        }
    }
    // A bare field name with no colon is a data-less field; treat as comment
    SseLine::Comment(line.to_string())
}

#[derive(Default)]
struct EventBuilder {
    data: Vec<String>,
    event: Option<String>,
    id: Option<String>,
    retry: Option<u64>,
}

impl EventBuilder {
    fn push(&mut self, line: SseLine) -> Option<SseEvent> {
        match line {
            SseLine::Data(data) => self.data.push(data),
            SseLine::Event(event) => self.event = Some(event),
            SseLine::Id(id) => self.id = Some(id),
            SseLine::Retry(ms) => self.retry = Some(ms),
            SseLine::Comment(_) => {}
            SseLine::Empty => return self.take(),
        }
        None
    }

    fn take(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() && self.event.is_none() {
            // Nothing to dispatch; id/retry alone do not form an event
            self.id = None;
            self.retry = None;
            return None;
        }
        let builder = std::mem::take(self);
        Some(SseEvent {
            event: builder
                .event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: builder.data.join("\n"),
            id: builder.id,
            retry: builder.retry,
        })
    }
}

/// Stream adapter from byte chunks to [`SseEvent`]s
///
/// Errors from the inner stream are passed through unchanged. When the inner
/// stream ends, a trailing event without its blank-line terminator is still
/// emitted.
pub struct SseStream<S> {
    inner: S,
    buffer: Vec<u8>,
    builder: EventBuilder,
    done: bool,
}

impl<S> SseStream<S> {
    /// Wrap a byte stream
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            builder: EventBuilder::default(),
            done: false,
        }
    }

    /// Pull complete lines out of the buffer until an event is ready
    fn drain_lines(&mut self) -> Option<SseEvent> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.builder.push(parse_line(&line)) {
                return Some(event);
            }
        }
        None
    }

    fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches('\r');
            if let Some(event) = self.builder.push(parse_line(line)) {
                return Some(event);
            }
        }
        self.builder.take()
    }
}

impl<S, B, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    type Item = Result<SseEvent, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.drain_lines() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    self.buffer.extend_from_slice(chunk.as_ref());
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    self.done = true;
                    return Poll::Ready(self.finish().map(Ok));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
