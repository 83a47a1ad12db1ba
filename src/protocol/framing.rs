//! Streaming JSON framing
//!
//! Clients write JSON values back to back on one socket with no length
//! prefix. The framer buffers raw bytes and cuts them into complete values:
//! a value split across reads waits for the rest, several values in one read
//! each become a frame, and bytes that can never parse become one malformed
//! frame. After junk the framer resumes at the next newline or `{`, and an
//! oversized value is skipped up to its closing bracket.

use serde_json::Value;

use crate::constants::buffer::{MAX_MESSAGE_BYTES, PENDING_INITIAL};

/// One unit cut from the byte stream
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Value(Value),
    /// Bytes that are not JSON, or an unterminated value that grew too large
    Malformed,
}

#[derive(Debug)]
pub struct MessageFramer {
    pending: Vec<u8>,
    max_pending: usize,
    /// Set while discarding the tail of an oversized value
    skip: Option<ValueSkipper>,
}

impl Default for MessageFramer {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_BYTES)
    }
}

impl MessageFramer {
    #[must_use]
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: Vec::with_capacity(PENDING_INITIAL.min(max_pending)),
            max_pending,
            skip: None,
        }
    }

    /// Bytes buffered for a value that is not complete yet
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Append `bytes` and return every frame they complete
    pub fn push(&mut self, mut bytes: &[u8]) -> Vec<Frame> {
        if let Some(skipper) = self.skip.as_mut() {
            match skipper.advance(bytes) {
                None => return Vec::new(),
                Some(end) => {
                    bytes = &bytes[end..];
                    self.skip = None;
                }
            }
        }
        self.pending.extend_from_slice(bytes);

        let mut frames = Vec::new();
        let mut start = 0;
        'segments: while start < self.pending.len() {
            let rest = &self.pending[start..];
            let mut stream = serde_json::Deserializer::from_slice(rest).into_iter::<Value>();
            loop {
                match stream.next() {
                    Some(Ok(value)) => frames.push(Frame::Value(value)),
                    // Trailing whitespace only
                    None => {
                        start = self.pending.len();
                        break 'segments;
                    }
                    Some(Err(e)) if e.is_eof() => {
                        start += stream.byte_offset();
                        break 'segments;
                    }
                    Some(Err(e)) => {
                        frames.push(Frame::Malformed);
                        // byte_offset is where the failed value began
                        let from = error_index(rest, &e).max(stream.byte_offset() + 1);
                        start += resync_point(rest, from);
                        continue 'segments;
                    }
                }
            }
        }
        self.pending.drain(..start);

        if self.pending.len() > self.max_pending {
            let mut skipper = ValueSkipper::default();
            if skipper.advance(&self.pending).is_none() {
                self.skip = Some(skipper);
            }
            self.pending.clear();
            frames.push(Frame::Malformed);
        }
        frames
    }
}

/// Byte index in `buf` that a decode error points at
fn error_index(buf: &[u8], e: &serde_json::Error) -> usize {
    let line_start = match e.line() {
        0 | 1 => 0,
        line => buf
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b == b'\n')
            .nth(line - 2)
            .map_or(buf.len(), |(i, _)| i + 1),
    };
    (line_start + e.column().saturating_sub(1)).min(buf.len())
}

/// Where decoding resumes after junk: past the next newline or at the next
/// `{`, searching from `from`
fn resync_point(buf: &[u8], from: usize) -> usize {
    let from = from.min(buf.len());
    buf[from..]
        .iter()
        .position(|&b| b == b'\n' || b == b'{')
        .map_or(buf.len(), |i| {
            let at = from + i;
            if buf[at] == b'\n' { at + 1 } else { at }
        })
}

/// Tracks bracket depth and string state to find where a value ends
/// without decoding it
#[derive(Debug, Default)]
struct ValueSkipper {
    depth: usize,
    in_string: bool,
    escaped: bool,
    started: bool,
}

impl ValueSkipper {
    /// Index just past the end of the value, if it ends within `bytes`
    fn advance(&mut self, bytes: &[u8]) -> Option<usize> {
        for (i, &b) in bytes.iter().enumerate() {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return Some(i + 1);
                    }
                }
                continue;
            }
            match b {
                b'"' => {
                    self.in_string = true;
                    self.started = true;
                }
                b'{' | b'[' => {
                    self.depth += 1;
                    self.started = true;
                }
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Some(i + 1);
                    }
                }
                // A bare scalar ends at the line
                b'\n' if self.started && self.depth == 0 => return Some(i + 1),
                b' ' | b'\t' | b'\r' | b'\n' => {}
                _ => self.started = true,
            }
        }
        None
    }
}
