//! NDJSON Stream Decoding
//!
//! The generate endpoint streams one JSON record per line, but HTTP chunk
//! boundaries do not align with line boundaries: a record may arrive split
//! across reads. The decoder buffers raw bytes, emits every complete line
//! as a parsed fragment, and keeps the unfinished tail for the next chunk.
//!
//! A line that fails to parse is a recoverable error: it is logged and
//! skipped, and decoding continues with the next line.

use serde::Deserialize;

/// One decoded fragment of a streamed generate response
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GenerateChunk {
    /// Partial response text carried by this fragment
    pub response: String,
    /// Whether the response is complete
    pub done: bool,
}

/// Incremental decoder for newline-delimited JSON fragments
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: String,
}

impl NdjsonDecoder {
    /// Create a decoder with an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk, returning every fragment completed by it
    pub fn push(&mut self, bytes: &[u8]) -> Vec<GenerateChunk> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim();
            if !line.is_empty() {
                if let Some(chunk) = parse_line(line) {
                    chunks.push(chunk);
                }
            }
            self.buffer = self.buffer[pos + 1..].to_string();
        }
        chunks
    }

    /// Consume the decoder at end-of-stream
    ///
    /// A non-empty tail means the transport ended mid-line. It is decoded
    /// if it happens to form a complete record, otherwise logged and
    /// dropped.
    #[must_use]
    pub fn finish(self) -> Option<GenerateChunk> {
        let line = self.buffer.trim();
        if line.is_empty() {
            return None;
        }
        parse_line(line)
    }
}

/// Parse one candidate line, logging and discarding malformed input
fn parse_line(line: &str) -> Option<GenerateChunk> {
    match serde_json::from_str::<GenerateChunk>(line) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            tracing::warn!(error = %e, line = line, "Skipping malformed stream line");
            None
        }
    }
}
