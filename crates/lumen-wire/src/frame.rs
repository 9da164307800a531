//! Turning socket reads into discrete text messages.
//!
//! The decoder never sees a zero-length read: that condition means the
//! peer closed the stream and is handled by the connection worker before
//! any bytes reach this module.

use crate::error::WireError;

/// Size of the buffer handed to each socket read.
pub const DEFAULT_READ_CHUNK: usize = 8192;

/// Largest partial frame kept while waiting for a delimiter (1 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 1 << 20;

/// How the byte stream is cut into messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FramingMode {
    /// Every non-empty read is exactly one message.
    ///
    /// Compatible with the reference server, which writes one JSON object
    /// per send. Breaks if the transport fragments or coalesces writes.
    #[default]
    PerRead,
    /// Messages are terminated by `\n`; reads are buffered until a
    /// delimiter arrives. Receipts are written with a trailing `\n` too.
    NewlineDelimited,
}

/// Stateful message decoder for one connection.
///
/// Call [`reset`](Self::reset) whenever the underlying connection is
/// replaced so that a partial frame from a dead stream cannot be glued
/// onto bytes from the next one.
#[derive(Debug)]
pub struct FrameDecoder {
    mode: FramingMode,
    pending: Vec<u8>,
    /// Prefix of `pending` already searched for a delimiter.
    scanned: usize,
    max_frame_len: usize,
}

impl FrameDecoder {
    /// Create a decoder for the given framing mode.
    pub fn new(mode: FramingMode) -> Self {
        Self {
            mode,
            pending: Vec::new(),
            scanned: 0,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Override the partial-frame limit used in delimited mode.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// The framing mode this decoder applies.
    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// Number of bytes held back waiting for a delimiter.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Drop any partially received frame.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.scanned = 0;
    }

    /// Decode one read's worth of bytes, returning the complete messages.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>, WireError> {
        let mut out = Vec::new();
        self.decode_into(chunk, &mut out)?;
        Ok(out)
    }

    /// Decode one read's worth of bytes, appending complete messages to `out`.
    ///
    /// On [`WireError::FrameTooLarge`] the oversized partial frame is
    /// discarded, but messages completed earlier in the same chunk are
    /// still appended to `out`.
    pub fn decode_into(&mut self, chunk: &[u8], out: &mut Vec<String>) -> Result<(), WireError> {
        match self.mode {
            FramingMode::PerRead => {
                if !chunk.is_empty() {
                    out.push(String::from_utf8_lossy(chunk).into_owned());
                }
                Ok(())
            }
            FramingMode::NewlineDelimited => self.decode_delimited(chunk, out),
        }
    }

    fn decode_delimited(&mut self, chunk: &[u8], out: &mut Vec<String>) -> Result<(), WireError> {
        self.pending.extend_from_slice(chunk);

        // Bytes before `scanned` held no delimiter on the previous call.
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.pending[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + offset;
            let mut line = &self.pending[start..end];
            if let [rest @ .., b'\r'] = line {
                line = rest;
            }
            if !line.iter().all(u8::is_ascii_whitespace) {
                out.push(String::from_utf8_lossy(line).into_owned());
            }
            start = end + 1;
            search_from = start;
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();

        if self.pending.len() > self.max_frame_len {
            self.reset();
            return Err(WireError::FrameTooLarge {
                limit: self.max_frame_len,
            });
        }
        Ok(())
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(FramingMode::default())
    }
}
