/// Splits decoded text into newline-terminated records.
///
/// Text after the last newline stays buffered until more text arrives or the
/// stream ends. Blank lines are dropped.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded fragment and return every line it completed.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let mut lines = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].find('\n') {
            let end = consumed + offset;
            if let Some(line) = non_blank(&self.buffer[consumed..end]) {
                lines.push(line.to_string());
            }
            consumed = end + 1;
        }
        self.buffer.drain(..consumed);
        lines
    }

    /// End-of-stream flush: the source does not guarantee a trailing newline,
    /// so a non-blank remainder is emitted as the final line.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        non_blank(&rest).map(str::to_string)
    }

    /// Length in bytes of the unterminated tail.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

fn non_blank(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
