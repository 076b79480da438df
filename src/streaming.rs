//! Incremental text decoding for streamed answers.
//!
//! Transport chunks are arbitrary byte slices, so a multi-byte character can
//! start in one chunk and end in the next. The decoder keeps the incomplete
//! tail until the rest of the character arrives.

use std::char::REPLACEMENT_CHARACTER;

/// Longest possible UTF-8 sequence
const MAX_SEQUENCE_LEN: usize = 4;

/// Stateful UTF-8 decoder for a chunked byte stream
#[derive(Debug, Clone, Default)]
pub struct Utf8ChunkDecoder {
    /// Bytes of a character that is not complete yet
    tail: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, holding back a trailing partial character.
    ///
    /// Invalid sequences are replaced with U+FFFD, like a non-fatal text decoder.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.tail.extend_from_slice(chunk);

        let mut text = String::with_capacity(self.tail.len());
        let mut rest: &[u8] = &self.tail;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(error) => {
                    let valid_up_to = error.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));
                    match error.error_len() {
                        Some(invalid_len) => {
                            text.push(REPLACEMENT_CHARACTER);
                            rest = &rest[valid_up_to + invalid_len..];
                        }
                        None => {
                            rest = &rest[valid_up_to..];
                            break;
                        }
                    }
                }
            }
        }

        let kept = rest.len();
        debug_assert!(kept < MAX_SEQUENCE_LEN);
        let consumed = self.tail.len() - kept;
        self.tail.drain(..consumed);
        text
    }

    /// Finish the stream. A dangling partial character becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.tail.is_empty() {
            return String::new();
        }
        self.tail.clear();
        REPLACEMENT_CHARACTER.to_string()
    }

    /// Whether bytes are waiting for the rest of their character
    pub fn has_partial(&self) -> bool {
        !self.tail.is_empty()
    }
}
