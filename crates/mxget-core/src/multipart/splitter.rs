//! Stateful splitter: turns arbitrarily chunked body bytes into parts.
//!
//! The first non-empty chunk decides the mode. A `multipart/x-mixed-replace`
//! content type selects streaming: every boundary found in the accumulated
//! buffer closes one part, which is handed to the callback immediately. Any
//! other type selects single-shot: the body is buffered and delivered as one
//! part by [`MultipartSplitter::finish`] once the transfer is over.

use thiserror::Error;
use tracing::{debug, warn};

use super::content_type::boundary_marker;
use super::headers::parse_part_headers;
use crate::part::{find_header, Flow, Part};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No body bytes seen yet.
    Unknown,
    SingleShot,
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("buffered more than {limit} bytes without a boundary")]
    SizeLimit { limit: usize },
}

/// Per-call parser state. Replaced wholesale at the start of every call.
#[derive(Debug)]
struct ParserState {
    mode: Mode,
    /// `--` + token; `Some` iff `mode == Streaming`.
    boundary: Option<Vec<u8>>,
    buffer: Vec<u8>,
    part_index: u64,
    /// Offset where the next boundary search starts; earlier bytes are known not to contain one.
    scan_from: usize,
}

impl ParserState {
    fn new() -> Self {
        Self {
            mode: Mode::Unknown,
            boundary: None,
            buffer: Vec::new(),
            part_index: 0,
            scan_from: 0,
        }
    }
}

#[derive(Debug)]
pub struct MultipartSplitter {
    state: ParserState,
    max_part_bytes: usize,
    malformed: u64,
    cancelled: bool,
}

impl MultipartSplitter {
    pub fn new(max_part_bytes: usize) -> Self {
        Self {
            state: ParserState::new(),
            max_part_bytes,
            malformed: 0,
            cancelled: false,
        }
    }

    /// Drops all state from a previous call, including buffer capacity.
    pub fn reset(&mut self, max_part_bytes: usize) {
        *self = Self::new(max_part_bytes);
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn boundary(&self) -> Option<&[u8]> {
        self.state.boundary.as_deref()
    }

    /// Number of parts handed to the callback so far in this call.
    pub fn parts_delivered(&self) -> u64 {
        self.state.part_index
    }

    /// Candidates dropped because their header block had no terminator.
    pub fn malformed_parts(&self) -> u64 {
        self.malformed
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Bytes currently held for the part in progress.
    pub fn buffered(&self) -> usize {
        self.state.buffer.len()
    }

    pub fn max_part_bytes(&self) -> usize {
        self.max_part_bytes
    }

    /// Feeds one body chunk. In streaming mode, delivers every part completed by it.
    ///
    /// Returns `Flow::Stop` once the callback has asked to stop; later chunks are ignored.
    pub fn push<F>(
        &mut self,
        content_type: Option<&str>,
        chunk: &[u8],
        on_part: &mut F,
    ) -> Result<Flow, SplitError>
    where
        F: FnMut(&Part<'_>) -> Flow,
    {
        if self.cancelled {
            return Ok(Flow::Stop);
        }
        if chunk.is_empty() {
            return Ok(Flow::Continue);
        }
        if self.state.mode == Mode::Unknown {
            self.resolve_mode(content_type);
        }

        self.state.buffer.extend_from_slice(chunk);
        if self.state.mode == Mode::Streaming && self.drain_parts(on_part).is_stop() {
            return Ok(Flow::Stop);
        }

        if self.state.buffer.len() > self.max_part_bytes {
            warn!(
                buffered = self.state.buffer.len(),
                limit = self.max_part_bytes,
                mode = ?self.state.mode,
                "part size limit exceeded"
            );
            self.state.buffer = Vec::new();
            return Err(SplitError::SizeLimit {
                limit: self.max_part_bytes,
            });
        }
        Ok(Flow::Continue)
    }

    /// Ends the call. In single-shot mode (or when no body arrived and the type is
    /// not a stream), delivers the whole buffer as part 0 and returns the callback's
    /// answer; in streaming mode returns `None`.
    ///
    /// `headers` are the response header lines; a `Content-Type` line is added
    /// when `content_type` is known and no such line is present.
    pub fn finish<F>(
        &mut self,
        content_type: Option<&str>,
        headers: &[String],
        on_part: &mut F,
    ) -> Option<Flow>
    where
        F: FnMut(&Part<'_>) -> Flow,
    {
        if self.state.mode == Mode::Unknown {
            self.resolve_mode(content_type);
        }
        if self.state.mode != Mode::SingleShot {
            return None;
        }

        let mut lines = headers.to_vec();
        if let Some(ct) = content_type {
            if find_header(&lines, "content-type").is_none() {
                lines.push(format!("Content-Type: {}", ct));
            }
        }
        let body = std::mem::take(&mut self.state.buffer);
        let part = Part {
            index: self.state.part_index,
            headers: &lines,
            payload: &body,
        };
        let flow = on_part(&part);
        self.state.part_index += 1;
        debug!(bytes = body.len(), "delivered single-shot body");
        Some(flow)
    }

    fn resolve_mode(&mut self, content_type: Option<&str>) {
        match content_type.and_then(boundary_marker) {
            Some(marker) => {
                debug!(
                    boundary = %String::from_utf8_lossy(&marker),
                    "multipart stream detected"
                );
                self.state.mode = Mode::Streaming;
                self.state.boundary = Some(marker);
            }
            None => {
                debug!(content_type = ?content_type, "single-shot response");
                self.state.mode = Mode::SingleShot;
                self.state.boundary = None;
            }
        }
    }

    /// Delivers every complete part in the buffer, in order.
    fn drain_parts<F>(&mut self, on_part: &mut F) -> Flow
    where
        F: FnMut(&Part<'_>) -> Flow,
    {
        let state = &mut self.state;
        let boundary = match state.boundary.as_deref() {
            Some(b) if !b.is_empty() => b,
            _ => return Flow::Continue,
        };

        loop {
            let Some(k) = find_from(&state.buffer, boundary, state.scan_from) else {
                // A match can only start in the last `len - 1` bytes once more data arrives.
                state.scan_from = state.buffer.len().saturating_sub(boundary.len() - 1);
                return Flow::Continue;
            };

            let candidate = &state.buffer[..trim_framing(&state.buffer[..k])];
            let mut flow = Flow::Continue;
            if candidate.is_empty() {
                debug!("skipping empty preamble before boundary");
            } else {
                match parse_part_headers(candidate) {
                    Ok(parsed) => {
                        let part = Part {
                            index: state.part_index,
                            headers: &parsed.lines,
                            payload: &candidate[parsed.payload_offset..],
                        };
                        flow = on_part(&part);
                        state.part_index += 1;
                    }
                    Err(e) => {
                        self.malformed += 1;
                        warn!(
                            index = state.part_index,
                            bytes = candidate.len(),
                            "dropping malformed part: {}",
                            e
                        );
                    }
                }
            }

            state.buffer.drain(..k + boundary.len());
            state.scan_from = 0;

            if flow.is_stop() {
                debug!(parts = state.part_index, "stream cancelled by callback");
                self.cancelled = true;
                state.buffer = Vec::new();
                return Flow::Stop;
            }
        }
    }
}

/// Length of `candidate` once the framing before a boundary is removed: a
/// trailing `--`, then at most two CR/LF bytes.
///
/// Payloads that themselves end in more CR/LF bytes keep all but two of them.
fn trim_framing(candidate: &[u8]) -> usize {
    let mut end = candidate.len();
    if candidate.ends_with(b"--") {
        end -= 2;
    }
    for _ in 0..2 {
        if end > 0 && matches!(candidate[end - 1], b'\r' | b'\n') {
            end -= 1;
        }
    }
    end
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
