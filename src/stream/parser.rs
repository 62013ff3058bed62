use tracing::debug;

use crate::error::ParseError;

/// One parsed NDJSON line. Shape is not validated here; consumers read the
/// fields they know about defensively.
pub type Record = serde_json::Value;

/// Parse a single framed line as exactly one JSON value.
pub fn parse_line(line: &str, line_number: usize) -> Result<Record, ParseError> {
    serde_json::from_str(line).map_err(|e| ParseError {
        line: line_number,
        message: e.to_string(),
    })
}

/// Line-by-line parser that skips and counts malformed lines.
#[derive(Debug, Default)]
pub struct RecordParser {
    lines: usize,
    parsed: usize,
    malformed: usize,
    first_error: Option<ParseError>,
}

impl RecordParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record, or `None` when the line is not valid JSON.
    pub fn parse(&mut self, line: &str) -> Option<Record> {
        self.lines += 1;
        match parse_line(line, self.lines) {
            Ok(record) => {
                self.parsed += 1;
                Some(record)
            }
            Err(e) => {
                debug!("Skipping {}", e);
                self.malformed += 1;
                self.first_error.get_or_insert(e);
                None
            }
        }
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn parsed(&self) -> usize {
        self.parsed
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }

    pub fn first_error(&self) -> Option<&ParseError> {
        self.first_error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_line() {
        let rec = parse_line(r#"{"id":"a","fullName":"Arena A"}"#, 1).unwrap();
        assert_eq!(rec, json!({"id": "a", "fullName": "Arena A"}));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse_line(r#"{"id":"a"} {"id":"b"}"#, 3).unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_malformed_lines_counted_not_fatal() {
        let mut p = RecordParser::new();
        assert!(p.parse(r#"{"id":"a"}"#).is_some());
        assert!(p.parse("not-json").is_none());
        assert!(p.parse(r#"{"id":"b"}"#).is_some());
        assert!(p.parse("{\"id\":").is_none());
        assert_eq!(p.lines(), 4);
        assert_eq!(p.parsed(), 2);
        assert_eq!(p.malformed(), 2);
        assert_eq!(p.first_error().map(|e| e.line), Some(2));
    }

    #[test]
    fn test_scalars_are_records() {
        // any JSON value is accepted; shape checks belong to the consumer
        let mut p = RecordParser::new();
        assert_eq!(p.parse("42"), Some(json!(42)));
        assert_eq!(p.parse("null"), Some(json!(null)));
        assert_eq!(p.malformed(), 0);
    }
}
