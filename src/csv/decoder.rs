//! Chunk decoding
//!
//! Byte chunks are decoded with a streaming [`encoding_rs::Decoder`], which
//! keeps an incomplete multi-byte sequence from the end of one chunk and
//! completes it with the start of the next. Text chunks pass through as-is.

use crate::csv::options::InputMode;
use crate::error::{CsvError, Result};
use encoding_rs::{CoderResult, Encoding};

/// One piece of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// Already-decoded text
    Text(&'a str),
    /// Raw bytes in the configured encoding
    Bytes(&'a [u8]),
}

impl Chunk<'_> {
    /// Size of the chunk in bytes
    pub fn len(&self) -> usize {
        match self {
            Chunk::Text(s) => s.len(),
            Chunk::Bytes(b) => b.len(),
        }
    }

    /// Check if chunk is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mode(&self) -> InputMode {
        match self {
            Chunk::Text(_) => InputMode::Text,
            Chunk::Bytes(_) => InputMode::Bytes,
        }
    }
}

impl<'a> From<&'a str> for Chunk<'a> {
    fn from(s: &'a str) -> Self {
        Chunk::Text(s)
    }
}

impl<'a> From<&'a String> for Chunk<'a> {
    fn from(s: &'a String) -> Self {
        Chunk::Text(s)
    }
}

impl<'a> From<&'a [u8]> for Chunk<'a> {
    fn from(b: &'a [u8]) -> Self {
        Chunk::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for Chunk<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        Chunk::Bytes(b)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Chunk<'a> {
    fn from(b: &'a [u8; N]) -> Self {
        Chunk::Bytes(b)
    }
}

/// Stateful chunk-to-text conversion
pub struct Decoder {
    mode: InputMode,
    encoding: &'static Encoding,
    inner: encoding_rs::Decoder,
    finished: bool,
}

impl Decoder {
    /// Create a decoder; `InputMode::Auto` is settled by the first chunk
    pub fn new(mode: InputMode, encoding: &'static Encoding) -> Self {
        Decoder {
            mode,
            encoding,
            // BOMs are data here; stripping them would differ from text mode
            inner: encoding.new_decoder_without_bom_handling(),
            finished: false,
        }
    }

    /// Resolved input mode (`Auto` until the first chunk)
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Encoding used for byte chunks
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Decode `chunk`, appending the text to `out`
    ///
    /// Bytes of an incomplete trailing sequence are held back until the next
    /// call or [`Decoder::finish`].
    pub fn decode(&mut self, chunk: Chunk<'_>, out: &mut String) -> Result<()> {
        if self.finished {
            return Err(CsvError::InvalidState(
                "Input already ended, cannot decode more chunks".to_string(),
            ));
        }

        match self.mode {
            InputMode::Auto => self.mode = chunk.mode(),
            mode if mode != chunk.mode() => {
                return Err(CsvError::TokenizationError(format!(
                    "Received {:?} chunk in {:?} mode",
                    chunk.mode(),
                    mode
                )));
            }
            _ => {}
        }

        match chunk {
            Chunk::Text(s) => out.push_str(s),
            Chunk::Bytes(b) => self.decode_bytes(b, out, false),
        }
        Ok(())
    }

    /// Flush any held-back bytes (as U+FFFD if still incomplete)
    pub fn finish(&mut self, out: &mut String) {
        if self.finished {
            return;
        }
        if self.mode == InputMode::Bytes {
            self.decode_bytes(&[], out, true);
        }
        self.finished = true;
    }

    fn decode_bytes(&mut self, mut src: &[u8], out: &mut String, last: bool) {
        loop {
            let needed = self
                .inner
                .max_utf8_buffer_length(src.len())
                .unwrap_or(src.len());
            out.reserve(needed);

            let (result, read, _replaced) = self.inner.decode_to_string(src, out, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("mode", &self.mode)
            .field("encoding", &self.encoding.name())
            .field("finished", &self.finished)
            .finish()
    }
}
