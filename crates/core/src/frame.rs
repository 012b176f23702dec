//! Frame Parser
//!
//! Incremental decoder for the insight agent's text-frame protocol:
//!
//! ```text
//! event: tool_start
//! data: {"name":"get_fee_table","args":{},"turn":1}
//!
//! ```
//!
//! Frames are separated by a blank line. `parse_frames` is pure: it decodes
//! every complete frame in a buffer and hands back the trailing partial frame
//! as the remainder, to be prepended to the next read. The parser works on
//! bytes so a multi-byte character split across two network reads is only
//! decoded once the frame is whole.

use thiserror::Error;

use crate::streaming::StreamEvent;

/// Event type assumed when a frame has no `event:` line.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// Reasons a single frame is skipped. Never fatal for the stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The `data:` payload is not valid JSON
    #[error("malformed JSON in '{event_type}' frame: {message}")]
    MalformedJson { event_type: String, message: String },

    /// Valid JSON that does not match the event's fields
    #[error("invalid '{event_type}' payload: {message}")]
    InvalidPayload { event_type: String, message: String },
}

/// Output of one `parse_frames` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFrames {
    pub events: Vec<StreamEvent>,
    /// Bytes after the last frame separator; possibly an incomplete frame.
    pub remainder: Vec<u8>,
}

/// Decode every complete frame in `buffer`.
///
/// Frames that fail to decode and frames with unknown event types are
/// skipped; the rest of the buffer is still processed.
pub fn parse_frames(buffer: &[u8]) -> ParsedFrames {
    let mut events = Vec::new();
    let consumed = drain_frames(buffer, 0, &mut events);
    ParsedFrames {
        events,
        remainder: buffer[consumed..].to_vec(),
    }
}

/// Decode complete frames, looking for separators no earlier than
/// `scan_from`. Returns the number of bytes consumed.
fn drain_frames(buffer: &[u8], scan_from: usize, events: &mut Vec<StreamEvent>) -> usize {
    let mut start = 0;
    let mut from = scan_from;
    while let Some((offset, sep_len)) = find_separator(&buffer[from..]) {
        let end = from + offset;
        push_decoded(&buffer[start..end], events);
        start = end + sep_len;
        from = start;
    }
    start
}

/// Decode a single frame (without its separator).
///
/// Returns `Ok(None)` for frames that carry no event: blank frames,
/// comment-only frames, frames without `data:`, and unknown event types.
pub fn decode_frame(frame: &[u8]) -> Result<Option<StreamEvent>, FrameError> {
    let text = String::from_utf8_lossy(frame);
    let mut event_type: Option<&str> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event_type = Some(value.trim()),
            "data" => data_lines.push(value),
            // id:, retry: and unknown fields carry nothing we use
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return Ok(None);
    }

    let event_type = match event_type {
        Some(t) if !t.is_empty() => t,
        _ => DEFAULT_EVENT_TYPE,
    };
    if !StreamEvent::is_known_type(event_type) {
        tracing::debug!("Ignoring frame with unknown event type '{}'", event_type);
        return Ok(None);
    }

    let data = data_lines.join("\n");
    let payload: serde_json::Value =
        serde_json::from_str(&data).map_err(|e| FrameError::MalformedJson {
            event_type: event_type.to_string(),
            message: e.to_string(),
        })?;

    StreamEvent::from_wire(event_type, payload)
        .map(Some)
        .map_err(|e| FrameError::InvalidPayload {
            event_type: event_type.to_string(),
            message: e.to_string(),
        })
}

fn push_decoded(frame: &[u8], events: &mut Vec<StreamEvent>) {
    match decode_frame(frame) {
        Ok(Some(event)) => events.push(event),
        Ok(None) => {}
        Err(e) => tracing::warn!("Skipping frame: {}", e),
    }
}

/// Leftmost blank line: `\n\n` or `\n\r\n`. Returns (offset, separator length).
fn find_separator(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buffer.len() {
        if buffer[i] == b'\n' {
            if buffer[i + 1] == b'\n' {
                return Some((i, 2));
            }
            if buffer[i + 1] == b'\r' && buffer.get(i + 2) == Some(&b'\n') {
                return Some((i, 3));
            }
        }
        i += 1;
    }
    None
}

/// Stateful wrapper around [`parse_frames`] that carries the remainder
/// between network reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    remainder: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns the events completed by it.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        // The held-back bytes hold no separator, except possibly one that
        // starts in their last two bytes and ends in `chunk`.
        let scan_from = self.remainder.len().saturating_sub(2);
        self.remainder.extend_from_slice(chunk);
        let mut events = Vec::new();
        let consumed = drain_frames(&self.remainder, scan_from, &mut events);
        self.remainder.drain(..consumed);
        events
    }

    /// Flush at end of stream: a final frame that arrived without its
    /// trailing blank line is decoded if it is complete JSON.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.remainder);
        let mut events = Vec::new();
        if rest.iter().any(|b| !b.is_ascii_whitespace()) {
            push_decoded(&rest, &mut events);
        }
        events
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn pending(&self) -> &[u8] {
        &self.remainder
    }

    pub fn reset(&mut self) {
        self.remainder.clear();
    }
}
