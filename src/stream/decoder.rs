use crate::error::DecodeError;

/// Replacement emitted for a complete but invalid UTF-8 sequence.
const REPLACEMENT: char = '\u{FFFD}';

/// Stateful UTF-8 decoder for a chunked byte stream.
///
/// A multi-byte character split across two chunks is held back after the
/// first chunk and emitted once the next chunk completes it. Invalid
/// sequences in the middle of the stream are replaced with U+FFFD; only an
/// unfinished sequence at end-of-stream is an error.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Bytes of an incomplete trailing sequence carried from the last chunk
    pending: Vec<u8>,
    replaced: usize,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let owned;
        let bytes: &[u8] = if self.pending.is_empty() {
            chunk
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            owned = joined;
            &owned
        };

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is well-formed
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            self.replaced += 1;
                            rest = &after[len..];
                        }
                        None => {
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Signal end-of-stream. Leftover bytes of an unfinished sequence are
    /// discarded and reported.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = self.pending.len();
        self.pending.clear();
        Err(DecodeError { pending })
    }

    /// Bytes currently held back waiting for the next chunk.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of invalid sequences replaced with U+FFFD so far.
    pub fn replaced(&self) -> usize {
        self.replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"{\"id\":\"a\"}\n"), "{\"id\":\"a\"}\n");
        assert!(d.finish().is_ok());
    }

    #[test]
    fn test_split_two_byte_char() {
        // "é" = C3 A9
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"caf\xC3"), "caf");
        assert_eq!(d.pending_len(), 1);
        assert_eq!(d.decode(b"\xA9!"), "é!");
        assert_eq!(d.pending_len(), 0);
        assert!(d.finish().is_ok());
    }

    #[test]
    fn test_four_byte_char_one_byte_at_a_time() {
        let text = "♞😀";
        let mut d = Utf8Decoder::new();
        let mut out = String::new();
        for b in text.as_bytes() {
            out.push_str(&d.decode(std::slice::from_ref(b)));
        }
        assert_eq!(out, text);
        assert!(d.finish().is_ok());
    }

    #[test]
    fn test_invalid_byte_midstream_is_replaced() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"a\xFFb"), "a\u{FFFD}b");
        assert_eq!(d.replaced(), 1);
        assert!(d.finish().is_ok());
    }

    #[test]
    fn test_truncated_tail_is_decode_error() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b"ok\xE2\x99"), "ok");
        assert_eq!(d.finish(), Err(DecodeError { pending: 2 }));
        // state is cleared once reported
        assert!(d.finish().is_ok());
    }

    #[test]
    fn test_empty_chunk() {
        let mut d = Utf8Decoder::new();
        assert_eq!(d.decode(b""), "");
        assert_eq!(d.decode(b"\xC3"), "");
        assert_eq!(d.decode(b""), "");
        assert_eq!(d.decode(b"\xA9"), "é");
    }
}
