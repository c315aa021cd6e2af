//! Stream Decoding
//!
//! The generation server streams newline-delimited JSON objects over a
//! chunked body. Each line is decoded independently; a malformed line is
//! surfaced as [`DecodedLine::Malformed`] so the caller can warn and skip
//! it without aborting the stream.

use serde_json::Value;

/// Outcome of decoding one line of a streamed response
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DecodedLine {
    /// Blank line, nothing to emit
    Empty,
    /// Text fragment from `response` or the nested `message.content`
    Text(String),
    /// Embedding fragment from the `embedding` field
    Embedding(Vec<f32>),
    /// Line was not valid JSON; warn and skip
    Malformed,
}

/// Decode a single NDJSON line into a fragment.
///
/// `embedding` selects the `embedding` field; otherwise the fragment is
/// `response`, falling back to `message.content`, falling back to empty.
pub(crate) fn decode_line(line: &str, embedding: bool) -> DecodedLine {
    let line = line.trim();
    if line.is_empty() {
        return DecodedLine::Empty;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(data) if embedding => DecodedLine::Embedding(embedding_fragment(&data)),
        Ok(data) => DecodedLine::Text(text_fragment(&data)),
        Err(_) => DecodedLine::Malformed,
    }
}

/// Extract the text fragment of a decoded server object.
pub(crate) fn text_fragment(data: &Value) -> String {
    if let Some(text) = data.get("response").and_then(Value::as_str) {
        return text.to_string();
    }
    data.get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Extract the embedding fragment of a decoded server object.
pub(crate) fn embedding_fragment(data: &Value) -> Vec<f32> {
    data.get("embedding")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_f64)
                .map(|v| v as f32)
                .collect()
        })
        .unwrap_or_default()
}

/// Accumulates raw body chunks and hands back complete lines.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete line it finishes.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut lines = Vec::new();
        while let Some(end) = self.buffer.find('\n') {
            let line = self.buffer[..end].to_string();
            self.buffer.drain(..=end);
            lines.push(line);
        }
        lines
    }

    /// The trailing partial line, if the body did not end with a newline.
    pub(crate) fn flush(self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            None
        } else {
            Some(self.buffer)
        }
    }
}
