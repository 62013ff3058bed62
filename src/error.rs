//! Error types for the ingestion pipeline.
//!
//! Transport-level failures (`Network`, `HttpStatus`, `Timeout`) end a single
//! read attempt and are what the fallback orchestrator reacts to.
//! `SourcesExhausted` is only produced once every endpoint of a plan failed.
//! Per-line `ParseError`s and the end-of-stream `DecodeError` never fail a
//! fetch; they are kept as diagnostics on the session stats.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Failure of a fetch against one or more endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The transport could not connect, or the body stream broke mid-read.
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The server answered with a non-success status. No body was read.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The deadline fired before the stream completed; the read was cancelled.
    #[error("deadline of {deadline:?} exceeded reading {url}")]
    Timeout { url: String, deadline: Duration },

    /// A single-document endpoint returned a body that is not JSON.
    #[error("invalid JSON document from {url}: {message}")]
    InvalidDocument { url: String, message: String },

    /// Every endpoint in the fallback plan failed.
    #[error("all sources exhausted: {}", describe_attempts(.attempts))]
    SourcesExhausted { attempts: Vec<SourceFailure> },
}

impl FetchError {
    /// Whether the orchestrator should move on to the next endpoint.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            FetchError::Network { .. } | FetchError::HttpStatus { .. } | FetchError::Timeout { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// One failed attempt recorded by the fallback orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    /// Endpoint label, e.g. "primary" or "secondary"
    pub endpoint: String,
    pub url: String,
    pub error: FetchError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.endpoint, self.error)
    }
}

fn describe_attempts(attempts: &[SourceFailure]) -> String {
    if attempts.is_empty() {
        return "no endpoints configured".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The stream ended in the middle of a multi-byte UTF-8 sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stream ended with {pending} undecodable trailing byte(s)")]
pub struct DecodeError {
    pub pending: usize,
}

/// A framed line that is not a single well-formed JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed record on line {line}: {message}")]
pub struct ParseError {
    /// 1-based index among the non-blank lines of the stream
    pub line: usize,
    pub message: String,
}
