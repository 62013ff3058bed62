//! Decode → frame → parse, one chunk at a time.
//!
//! ```text
//!  bytes ──▶ Utf8Decoder ──text──▶ LineFramer ──lines──▶ RecordParser ──▶ records
//! ```
//!
//! Records come out in the order their lines appear in the source. A record
//! is only ever produced from a complete line that parsed.

use crate::error::{DecodeError, ParseError};

use super::decoder::Utf8Decoder;
use super::framer::LineFramer;
use super::parser::{Record, RecordParser};

#[derive(Debug, Default)]
pub struct Pipeline {
    decoder: Utf8Decoder,
    framer: LineFramer,
    parser: RecordParser,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk, appending every record it completed to `out`.
    pub fn feed(&mut self, chunk: &[u8], out: &mut Vec<Record>) {
        let text = self.decoder.decode(chunk);
        if text.is_empty() {
            return;
        }
        for line in self.framer.push(&text) {
            out.extend(self.parser.parse(&line));
        }
    }

    /// End-of-stream: flush the unterminated tail and report an unfinished
    /// multi-byte sequence, if any. Records already produced are unaffected.
    pub fn finish(&mut self, out: &mut Vec<Record>) -> Result<(), DecodeError> {
        let decoded = self.decoder.finish();
        if let Some(line) = self.framer.finish() {
            out.extend(self.parser.parse(&line));
        }
        decoded
    }

    pub fn lines(&self) -> usize {
        self.parser.lines()
    }

    pub fn malformed(&self) -> usize {
        self.parser.malformed()
    }

    pub fn replaced_sequences(&self) -> usize {
        self.decoder.replaced()
    }

    pub fn first_parse_error(&self) -> Option<&ParseError> {
        self.parser.first_error()
    }
}

/// Run a whole payload, split into the given chunks, through a fresh pipeline.
pub fn parse_chunks<'a, I>(chunks: I) -> (Vec<Record>, Pipeline)
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut pipeline = Pipeline::new();
    let mut records = Vec::new();
    for chunk in chunks {
        pipeline.feed(chunk, &mut records);
    }
    // a truncated tail is visible through the returned pipeline's counters
    let _ = pipeline.finish(&mut records);
    (records, pipeline)
}
