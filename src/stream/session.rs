//! One read attempt against one endpoint.
//!
//! A [`StreamSession`] owns everything the attempt mutates (decoder state,
//! line buffer, counters, deadline token) and is consumed by [`StreamSession::run`],
//! so it can never be reused for a second request.
//!
//! The read loop is the only suspension point: each wait (connect, then each
//! next chunk) is raced against the deadline. When the deadline wins, the body
//! stream is dropped on the spot, which closes the underlying connection.

use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::error::{DecodeError, FetchError, ParseError};

use super::deadline::{DeadlineConfig, DeadlineToken, TokenState};
use super::fetcher::{FetchRequest, StreamFetcher};
use super::parser::Record;
use super::pipeline::Pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Reading,
    Cancelled,
    Done,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Cancelled | SessionState::Done | SessionState::Failed
        )
    }
}

/// Counters collected while reading one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub chunks: usize,
    pub bytes: usize,
    /// Non-blank lines framed
    pub lines: usize,
    pub records: usize,
    pub malformed: usize,
    /// Invalid UTF-8 sequences replaced with U+FFFD
    pub replaced_sequences: usize,
    pub decode_error: Option<DecodeError>,
    pub first_parse_error: Option<ParseError>,
}

impl SessionStats {
    /// The stream had lines but none of them parsed.
    pub fn all_lines_invalid(&self) -> bool {
        self.lines > 0 && self.records == 0
    }
}

/// What a finished session hands back to its caller.
#[derive(Debug)]
pub struct SessionReport {
    pub url: String,
    pub state: SessionState,
    pub deadline: TokenState,
    pub stats: SessionStats,
    pub result: Result<Vec<Record>, FetchError>,
}

impl SessionReport {
    pub fn into_result(self) -> Result<Vec<Record>, FetchError> {
        self.result
    }
}

pub struct StreamSession {
    request: FetchRequest,
    pipeline: Pipeline,
    deadline: DeadlineToken,
    state: SessionState,
    records: Vec<Record>,
    chunks: usize,
    bytes: usize,
    decode_error: Option<DecodeError>,
}

impl StreamSession {
    pub fn new(request: FetchRequest, deadline: DeadlineConfig) -> Self {
        StreamSession {
            request,
            pipeline: Pipeline::new(),
            deadline: DeadlineToken::new(deadline),
            state: SessionState::Open,
            records: Vec::new(),
            chunks: 0,
            bytes: 0,
            decode_error: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.request.url
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Open the stream, read it to the end, and report.
    pub async fn run(mut self, fetcher: &dyn StreamFetcher) -> SessionReport {
        self.deadline.arm();
        let result = self.read_all(fetcher).await;
        match &result {
            Ok(()) => {
                self.deadline.disarm();
                self.state = SessionState::Done;
            }
            Err(FetchError::Timeout { .. }) => {
                self.deadline.fire();
                self.state = SessionState::Cancelled;
            }
            Err(_) => {
                self.deadline.disarm();
                self.state = SessionState::Failed;
            }
        }
        self.report(result)
    }

    async fn read_all(&mut self, fetcher: &dyn StreamFetcher) -> Result<(), FetchError> {
        let open = tokio::time::timeout_at(self.deadline.step_deadline(), fetcher.open(&self.request))
            .await
            .map_err(|_| self.timeout_error())??;

        self.state = SessionState::Reading;
        debug!("Reading {} (status {})", self.request.url, open.status);
        let mut body = open.body;

        loop {
            let next = tokio::time::timeout_at(self.deadline.step_deadline(), body.next()).await;
            match next {
                Err(_) => {
                    // Dropping the body aborts the in-flight read and closes the connection.
                    drop(body);
                    warn!(
                        "Deadline of {:?} ({:?}) exceeded reading {} after {} record(s)",
                        self.deadline.duration(),
                        self.deadline.policy(),
                        self.request.url,
                        self.records.len()
                    );
                    return Err(self.timeout_error());
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    warn!("Stream from {} broke after {} chunk(s): {}", self.request.url, self.chunks, e);
                    return Err(e);
                }
                Ok(Some(Ok(chunk))) => {
                    self.chunks += 1;
                    self.bytes += chunk.len();
                    self.pipeline.feed(&chunk, &mut self.records);
                }
            }
        }

        if let Err(e) = self.pipeline.finish(&mut self.records) {
            warn!("{}: {}", self.request.url, e);
            self.decode_error = Some(e);
        }

        info!(
            "Read {} record(s) from {} ({} malformed, {} bytes)",
            self.records.len(),
            self.request.url,
            self.pipeline.malformed(),
            self.bytes
        );
        Ok(())
    }

    fn timeout_error(&self) -> FetchError {
        FetchError::Timeout {
            url: self.request.url.clone(),
            deadline: self.deadline.duration(),
        }
    }

    fn report(self, result: Result<(), FetchError>) -> SessionReport {
        let stats = SessionStats {
            chunks: self.chunks,
            bytes: self.bytes,
            lines: self.pipeline.lines(),
            records: self.records.len(),
            malformed: self.pipeline.malformed(),
            replaced_sequences: self.pipeline.replaced_sequences(),
            decode_error: self.decode_error,
            first_parse_error: self.pipeline.first_parse_error().cloned(),
        };
        SessionReport {
            url: self.request.url,
            state: self.state,
            deadline: self.deadline.state(),
            stats,
            result: result.map(|()| self.records),
        }
    }
}
