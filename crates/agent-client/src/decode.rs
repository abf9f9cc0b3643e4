use tracing::warn;

use crate::event::AgentEvent;

const FRAME_PREFIX: &[u8] = b"data: ";

/// Incremental decoder from raw response-body chunks to [`AgentEvent`]s.
///
/// The wire protocol is one `data: <json>` frame per line. Chunk boundaries
/// may fall anywhere, including inside a multi-byte code point, so the
/// decoder buffers raw bytes and only splits at `\n`, which as an ASCII
/// byte can never occur inside a multi-byte UTF-8 sequence. UTF-8 decoding
/// happens per extracted frame, after the split.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    dropped_frames: u64,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every event it completes, in order.
    ///
    /// A trailing partial line stays buffered for the next call; an empty
    /// chunk is a no-op.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<AgentEvent> {
        if chunk.is_empty() {
            return Vec::new();
        }
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = trim_line_ending(&line);
            if let Some(event) = self.decode_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Salvages a trailing unterminated frame at end of stream.
    ///
    /// Residual bytes that do not form a complete frame are discarded
    /// rather than synthesized into content.
    pub fn flush(&mut self) -> Option<AgentEvent> {
        if self.buf.is_empty() {
            return None;
        }
        let residual = std::mem::take(&mut self.buf);
        self.decode_line(trim_line_ending(&residual))
    }

    /// Number of `data:` frames dropped because their payload failed to
    /// decode. Dropped frames never interrupt the stream.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<AgentEvent> {
        // Lines without the frame prefix are blank separators or comments.
        let payload = line.strip_prefix(FRAME_PREFIX)?;
        let Ok(payload) = std::str::from_utf8(payload) else {
            self.dropped_frames += 1;
            warn!("dropping frame with invalid UTF-8 payload");
            return None;
        };
        match AgentEvent::from_json_str(payload) {
            Ok(event) => Some(event),
            Err(err) => {
                self.dropped_frames += 1;
                warn!(%err, "dropping undecodable frame");
                None
            }
        }
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
