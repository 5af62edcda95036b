//! Frame encoding and incremental decoding.
//!
//! A frame is one JSON record followed by a single `\n`. [`FrameDecoder`]
//! accumulates arbitrary read chunks and yields complete frames in arrival
//! order, so several frames in one read and one frame split across reads
//! both decode the same way.

use crate::error::{Result, TtsError};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Frame delimiter.
pub const DELIMITER: u8 = b'\n';

/// Serialize `record` as compact JSON followed by the delimiter.
///
/// # Errors
///
/// Returns [`TtsError::Protocol`] if serialization fails.
pub fn encode_frame<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(record)
        .map_err(|e| TtsError::Protocol(format!("failed to encode frame: {e}")))?;
    bytes.push(DELIMITER);
    Ok(bytes)
}

/// Incremental frame decoder owned by one connection.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes buffered after the last complete frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete frame and parse it as `T`.
    ///
    /// Returns `None` when no full frame is buffered. Blank lines are
    /// consumed silently. A frame that fails to parse is consumed and
    /// reported as `Some(Err(_))`; decoding can continue afterwards.
    pub fn next_frame<T: DeserializeOwned>(&mut self) -> Option<Result<T>> {
        loop {
            let pos = self.buf.iter().position(|&b| b == DELIMITER)?;
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let payload = &line[..pos];
            if payload.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Some(
                serde_json::from_slice(payload)
                    .map_err(|e| TtsError::Protocol(format!("malformed frame: {e}"))),
            );
        }
    }
}
