//! Frame decoder: turns a raw upstream byte stream into decoded JSON
//! event payloads.
//!
//! All supported dialects frame their streams the same way: one
//! `data: <json>` event per line, with OpenAI-style streams ending in a
//! `data: [DONE]` sentinel. Only the payload shape differs, so framing is
//! decoded here and the payloads are interpreted by the provider adapters.

use crate::Error;
use futures_util::{Stream, StreamExt};
use memchr::memchr;
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Residual buffer cap. A single event line should never get close.
const MAX_BUFFER_SIZE: usize = 1_000_000;

/// A stream adapter that decodes line-framed JSON payloads from a byte
/// stream. Maintains a residual buffer so chunk boundaries falling mid-line
/// or mid-character are invisible to consumers.
pub struct FrameStream<S> {
    /// The underlying byte stream
    inner: S,
    /// Raw bytes carried over from previous chunks; always ends short of a
    /// newline
    buffer: Vec<u8>,
    /// Decoded payloads ready to be yielded
    frames: VecDeque<Value>,
}

impl<S> FrameStream<S> {
    /// Create a new frame stream from a byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            frames: VecDeque::new(),
        }
    }

    /// Decode every complete line currently in the buffer, retaining the
    /// trailing fragment.
    fn parse_buffer(&mut self) {
        let mut start = 0;

        while let Some(pos) = memchr(b'\n', &self.buffer[start..]) {
            let line_end = start + pos;
            if let Some(frame) = Self::decode_line(&self.buffer[start..line_end]) {
                self.frames.push_back(frame);
            }
            start = line_end + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
    }

    /// Decode one complete line into a payload, or `None` for blank lines,
    /// the termination sentinel, and anything undecodable. A bad line never
    /// aborts the stream.
    fn decode_line(raw: &[u8]) -> Option<Value> {
        let line = match std::str::from_utf8(raw) {
            Ok(text) => text.trim(),
            Err(e) => {
                tracing::warn!("skipping non-UTF-8 stream line: {e}");
                return None;
            }
        };

        if line.is_empty() {
            return None;
        }

        // Strip the SSE event prefix; other SSE framing fields carry no
        // payload and are dropped. Lines without any prefix are tried as-is.
        let data = match line.strip_prefix("data:") {
            Some(rest) => rest.trim_start(),
            None if line.starts_with("event:")
                || line.starts_with("id:")
                || line.starts_with("retry:")
                || line.starts_with(':') =>
            {
                return None;
            }
            None => line,
        };

        if data == "[DONE]" {
            return None;
        }

        match serde_json::from_str(data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("skipping undecodable stream line: {e}");
                None
            }
        }
    }
}

impl<S, E> Stream for FrameStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<Value, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            // Yield already-decoded payloads first, in arrival order.
            if let Some(frame) = self.frames.pop_front() {
                return Poll::Ready(Some(Ok(frame)));
            }

            let chunk = match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    return Poll::Ready(Some(Err(Error::transport(format!(
                        "stream read failed: {e}"
                    )))));
                }
                None => {
                    // A dangling partial line at end of input means the
                    // stream closed; it is not a completeness error.
                    if !self.buffer.is_empty() {
                        tracing::debug!(
                            "discarding {} residual bytes at end of stream",
                            self.buffer.len()
                        );
                        self.buffer.clear();
                    }
                    return Poll::Ready(None);
                }
            };

            self.buffer.extend_from_slice(&chunk);

            if self.buffer.len() > MAX_BUFFER_SIZE {
                self.buffer.clear();
                return Poll::Ready(Some(Err(Error::transport(
                    "stream line exceeded maximum buffer size",
                ))));
            }

            self.parse_buffer();
        }
    }
}

/// Extension trait to frame-decode byte streams.
pub trait FrameStreamExt: Stream {
    /// Decode this byte stream as line-framed JSON payloads.
    fn frames(self) -> FrameStream<Self>
    where
        Self: Sized,
    {
        FrameStream::new(self)
    }
}

impl<S: Stream> FrameStreamExt for S {}
