//! Wire format of the chat endpoint.
//!
//! `POST /api/chat` takes a [`ChatRequest`] and answers with a
//! `text/event-stream` body of `data: {"content": "..."}` frames, closed by a
//! literal `data: [DONE]` frame.
//!
//! The server side encodes frames with [`sse_frame`]; the client side feeds raw
//! network chunks into a [`FrameDecoder`], which buffers partial lines so a
//! frame split across chunks (even inside a UTF-8 sequence) still decodes.
//!
//! # Example
//!
//! ```rust
//! use form_chat::wire::{FrameDecoder, StreamFrame, sse_frame};
//!
//! let encoded = sse_frame(&StreamFrame::Content("Hello".to_string()));
//! assert_eq!(encoded, "data: {\"content\":\"Hello\"}\n\n");
//!
//! let mut decoder = FrameDecoder::default();
//! let frames = decoder.push(encoded.as_bytes());
//! assert_eq!(frames, vec![StreamFrame::Content("Hello".to_string())]);
//! ```

use serde::{Deserialize, Serialize};

/// Payload of the closing frame.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message produced by a clicked option.
    User,
    /// Model output.
    Assistant,
}

impl MessageRole {
    /// Lowercase name as used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One `{role, content}` pair of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author of the turn.
    pub role: MessageRole,
    /// Text of the turn.
    pub content: String,
}

impl ChatTurn {
    /// Create a turn.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Full ordered history; the last entry is the new turn.
    pub messages: Vec<ChatTurn>,
}

/// A decoded stream frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// A text fragment to append to the pending assistant message.
    Content(String),
    /// The stream is complete.
    Done,
}

#[derive(Debug, Deserialize)]
struct ContentPayload {
    #[serde(default)]
    content: String,
}

/// Encode a frame as an SSE `data:` event.
pub fn sse_frame(frame: &StreamFrame) -> String {
    match frame {
        StreamFrame::Content(text) => {
            let json = serde_json::json!({ "content": text });
            format!("data: {json}\n\n")
        }
        StreamFrame::Done => format!("data: {DONE_SENTINEL}\n\n"),
    }
}

/// Splits a byte stream into text lines.
///
/// Lines are cut on `\n` only, so a multi-byte UTF-8 sequence is never split;
/// a trailing `\r` is dropped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line = self.buf.drain(..=pos).collect::<Vec<_>>();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Flush the unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_suffix('\r').unwrap_or(&text).to_string()
}

/// Extract the payload of an SSE `data:` line.
pub fn data_payload(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?;
    Some(data.strip_prefix(' ').unwrap_or(data))
}

/// Incremental decoder for the chat stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    lines: LineBuffer,
}

impl FrameDecoder {
    /// Feed one network chunk; returns the frames it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.lines
            .push(chunk)
            .iter()
            .filter_map(|line| parse_line(line))
            .collect()
    }

    /// Decode whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        self.lines
            .finish()
            .and_then(|line| parse_line(&line))
            .into_iter()
            .collect()
    }
}

/// Decode one line of the stream.
///
/// Non-`data:` lines and empty fragments yield `None`; malformed JSON is
/// logged and skipped.
pub fn parse_line(line: &str) -> Option<StreamFrame> {
    let data = data_payload(line)?;
    if data == DONE_SENTINEL {
        return Some(StreamFrame::Done);
    }

    match serde_json::from_str::<ContentPayload>(data) {
        Ok(payload) if payload.content.is_empty() => None,
        Ok(payload) => Some(StreamFrame::Content(payload.content)),
        Err(e) => {
            tracing::warn!(
                name: "stream.frame.malformed",
                error = %e,
                data = %data,
                "Skipping malformed stream frame"
            );
            None
        }
    }
}
