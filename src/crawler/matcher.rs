//! Incremental line matcher over a streaming response body
//!
//! `MatchStream` reads the body chunk by chunk, splits it into lines and
//! yields the first capture group of the first match on each non-empty line.
//! Only the current partial line is ever buffered, so patterns that span a
//! line break never match.

use crate::crawler::fetcher::ByteStream;
use crate::FetchError;
use futures_util::{Stream, StreamExt};
use regex::Regex;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Lazy, single-pass sequence of per-line extractions
///
/// The stream owns its byte source, so it can only be consumed once. After it
/// has returned `None` (or an error) it keeps returning `None`.
pub struct MatchStream {
    source: ByteStream,
    pattern: Arc<Regex>,
    target: String,
    buffer: Vec<u8>,
    /// Start of the current line in `buffer`
    cursor: usize,
    /// Bytes before this offset are known to hold no newline after `cursor`
    scanned: usize,
    source_done: bool,
    finished: bool,
}

impl MatchStream {
    /// Creates a matcher over `source`
    ///
    /// `target` is only used to label errors.
    pub fn new(source: ByteStream, pattern: Arc<Regex>, target: impl Into<String>) -> Self {
        Self {
            source,
            pattern,
            target: target.into(),
            buffer: Vec::new(),
            cursor: 0,
            scanned: 0,
            source_done: false,
            finished: false,
        }
    }

    /// Takes the next complete line out of the buffer
    ///
    /// Once the source is exhausted, the trailing unterminated line is
    /// returned as well.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let from = self.scanned.max(self.cursor);
        let newline = self.buffer[from..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|offset| from + offset);

        let line = match newline {
            Some(end) => {
                let line = self.buffer[self.cursor..end].to_vec();
                self.cursor = end + 1;
                self.scanned = self.cursor;
                line
            }
            None if self.source_done && self.cursor < self.buffer.len() => {
                let line = self.buffer[self.cursor..].to_vec();
                self.cursor = self.buffer.len();
                self.scanned = self.cursor;
                line
            }
            None => {
                // Keep only the partial line before reading more
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
                self.scanned = self.buffer.len();
                return None;
            }
        };

        Some(line)
    }

    /// Applies the pattern to one raw line
    fn match_line(&self, mut line: Vec<u8>) -> Result<Option<String>, FetchError> {
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.is_empty() {
            return Ok(None);
        }

        let text = String::from_utf8(line).map_err(|_| FetchError::Decode {
            url: self.target.clone(),
        })?;

        Ok(self
            .pattern
            .captures(&text)
            .and_then(|captures| captures.get(1))
            .map(|group| group.as_str().to_string()))
    }

    fn finish(&mut self) {
        self.finished = true;
        self.buffer = Vec::new();
        self.cursor = 0;
        self.scanned = 0;
    }
}

impl Stream for MatchStream {
    type Item = Result<String, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            if let Some(line) = this.take_line() {
                match this.match_line(line) {
                    Ok(Some(extracted)) => {
                        tracing::trace!("Match in {}: {}", this.target, extracted);
                        return Poll::Ready(Some(Ok(extracted)));
                    }
                    Ok(None) => continue,
                    Err(e) => {
                        this.finish();
                        return Poll::Ready(Some(Err(e)));
                    }
                }
            }

            if this.source_done {
                this.finish();
                return Poll::Ready(None);
            }

            match this.source.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => this.buffer.extend_from_slice(&chunk),
                Poll::Ready(Some(Err(e))) => {
                    this.finish();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => this.source_done = true,
            }
        }
    }
}
