use std::collections::VecDeque;

use bytes::{Buf, BytesMut};
use futures_util::stream::{self, BoxStream, StreamExt};

use super::api::ServiceError;

/// Incremental decoder for server-sent event frames.
///
/// Feed raw transport chunks in any fragmentation; complete events come out
/// as their joined `data:` payloads. Handles CRLF line endings, multi-line
/// `data:` fields, and skips comment/`event:`/`id:`/`retry:` lines.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    buffer: BytesMut,
    data_lines: Vec<String>,
}

impl SseFrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one transport chunk and returns every event payload it
    /// completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(line) = self.take_line() {
            match line {
                Line::Blank => {
                    if !self.data_lines.is_empty() {
                        events.push(self.data_lines.join("\n"));
                        self.data_lines.clear();
                    }
                }
                Line::Data(payload) => self.data_lines.push(payload),
                Line::Other => {}
            }
        }
        events
    }

    fn take_line(&mut self) -> Option<Line> {
        let newline = self.buffer.iter().position(|b| *b == b'\n')?;
        let raw = self.buffer.split_to(newline + 1);
        let mut line = &raw[..newline];
        if line.ends_with(b"\r") {
            line = &line[..line.len() - 1];
        }
        if line.is_empty() {
            return Some(Line::Blank);
        }
        let text = String::from_utf8_lossy(line);
        match text.strip_prefix("data:") {
            // The space after the colon is optional per the SSE grammar.
            Some(payload) => Some(Line::Data(
                payload.strip_prefix(' ').unwrap_or(payload).to_string(),
            )),
            None => Some(Line::Other),
        }
    }
}

enum Line {
    Blank,
    Data(String),
    Other,
}

/// A live run event stream: one item per SSE message payload.
///
/// Session-scoped and single-consumer; dropping it closes the underlying
/// connection.
pub struct RunStream {
    inner: BoxStream<'static, Result<String, ServiceError>>,
}

impl std::fmt::Debug for RunStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStream").finish_non_exhaustive()
    }
}

impl RunStream {
    /// Decodes the body of a streaming HTTP response.
    #[must_use]
    pub fn from_response(response: reqwest::Response) -> Self {
        let state = (
            response.bytes_stream(),
            SseFrameDecoder::new(),
            VecDeque::new(),
        );
        let inner = stream::unfold(state, |(mut bytes, mut decoder, mut pending)| async move {
            loop {
                if let Some(payload) = pending.pop_front() {
                    return Some((Ok(payload), (bytes, decoder, pending)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        pending.extend(decoder.feed(chunk.chunk()));
                    }
                    Some(Err(err)) => {
                        return Some((Err(ServiceError::Transport(err)), (bytes, decoder, pending)));
                    }
                    None => return None,
                }
            }
        })
        .boxed();
        Self { inner }
    }

    /// Wraps an already-decoded message stream; used by scripted services in
    /// tests.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: futures_util::Stream<Item = Result<String, ServiceError>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// The next message payload, or `None` when the connection closed.
    pub async fn next(&mut self) -> Option<Result<String, ServiceError>> {
        self.inner.next().await
    }
}
