//! Primary/secondary sequencing for NDJSON sources.
//!
//! ```text
//!  PrimaryAttempt ──ok──────────────────────────▶ Done(records)
//!        │ Network / HttpStatus / Timeout
//!        ▼
//!  SecondaryAttempt ──ok────────────────────────▶ Done(records)
//!        │ any failure
//!        ▼
//!  Exhausted ──▶ SourcesExhausted { attempts }
//! ```
//!
//! Attempts run strictly one after another, so a fetch never holds more than
//! one open connection.

use tracing::{info, warn};

use crate::error::{FetchError, SourceFailure};

use super::deadline::DeadlineConfig;
use super::fetcher::{FetchRequest, StreamFetcher};
use super::parser::Record;
use super::session::{SessionStats, StreamSession};

/// One endpoint of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub label: String,
    pub request: FetchRequest,
}

impl Endpoint {
    pub fn new(label: impl Into<String>, request: FetchRequest) -> Self {
        Endpoint {
            label: label.into(),
            request,
        }
    }
}

/// Ordered endpoints for one fetch: a primary and an optional secondary.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPlan {
    primary: Endpoint,
    secondary: Option<Endpoint>,
}

impl FallbackPlan {
    pub fn new(primary: FetchRequest) -> Self {
        FallbackPlan {
            primary: Endpoint::new("primary", primary),
            secondary: None,
        }
    }

    pub fn with_fallback(mut self, secondary: FetchRequest) -> Self {
        self.secondary = Some(Endpoint::new("secondary", secondary));
        self
    }

    pub fn primary(&self) -> &Endpoint {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&Endpoint> {
        self.secondary.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    PrimaryAttempt,
    SecondaryAttempt,
    Exhausted,
    Done,
}

/// Result of running a plan.
#[derive(Debug)]
pub enum FetchOutcome {
    Success {
        /// Label of the endpoint that served the records
        endpoint: String,
        records: Vec<Record>,
        stats: SessionStats,
    },
    Failure(FetchError),
}

impl FetchOutcome {
    pub fn into_result(self) -> Result<Vec<Record>, FetchError> {
        match self {
            FetchOutcome::Success { records, .. } => Ok(records),
            FetchOutcome::Failure(e) => Err(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn stats(&self) -> Option<&SessionStats> {
        match self {
            FetchOutcome::Success { stats, .. } => Some(stats),
            FetchOutcome::Failure(_) => None,
        }
    }
}

/// Runs a [`FallbackPlan`] through the stream pipeline.
pub struct FallbackOrchestrator<'a> {
    fetcher: &'a dyn StreamFetcher,
    deadline: DeadlineConfig,
    state: FallbackState,
    history: Vec<FallbackState>,
}

impl<'a> FallbackOrchestrator<'a> {
    pub fn new(fetcher: &'a dyn StreamFetcher, deadline: DeadlineConfig) -> Self {
        FallbackOrchestrator {
            fetcher,
            deadline,
            state: FallbackState::PrimaryAttempt,
            history: vec![FallbackState::PrimaryAttempt],
        }
    }

    pub fn state(&self) -> FallbackState {
        self.state
    }

    /// Every state visited, in order.
    pub fn history(&self) -> &[FallbackState] {
        &self.history
    }

    pub async fn run(&mut self, plan: &FallbackPlan) -> FetchOutcome {
        self.state = FallbackState::PrimaryAttempt;
        self.history = vec![FallbackState::PrimaryAttempt];
        let mut attempts: Vec<SourceFailure> = Vec::new();

        loop {
            let endpoint = match (self.state, &plan.secondary) {
                (FallbackState::PrimaryAttempt, _) => &plan.primary,
                (FallbackState::SecondaryAttempt, Some(secondary)) => secondary,
                (FallbackState::SecondaryAttempt, None) => {
                    self.transition(FallbackState::Exhausted);
                    continue;
                }
                (FallbackState::Exhausted | FallbackState::Done, _) => break,
            };

            let report = StreamSession::new(endpoint.request.clone(), self.deadline)
                .run(self.fetcher)
                .await;

            match report.result {
                Ok(records) => {
                    if !attempts.is_empty() {
                        info!(
                            "{} endpoint {} served {} record(s) after earlier failure",
                            endpoint.label,
                            report.url,
                            records.len()
                        );
                    }
                    self.transition(FallbackState::Done);
                    return FetchOutcome::Success {
                        endpoint: endpoint.label.clone(),
                        records,
                        stats: report.stats,
                    };
                }
                Err(error) => {
                    warn!("{} endpoint failed: {}", endpoint.label, error);
                    let fall_through = error.triggers_fallback();
                    attempts.push(SourceFailure {
                        endpoint: endpoint.label.clone(),
                        url: report.url,
                        error,
                    });
                    let next = match self.state {
                        FallbackState::PrimaryAttempt if fall_through && plan.secondary.is_some() => {
                            FallbackState::SecondaryAttempt
                        }
                        _ => FallbackState::Exhausted,
                    };
                    self.transition(next);
                }
            }
        }

        warn!("All {} source(s) failed", attempts.len());
        FetchOutcome::Failure(FetchError::SourcesExhausted { attempts })
    }

    fn transition(&mut self, next: FallbackState) {
        self.state = next;
        self.history.push(next);
    }
}
