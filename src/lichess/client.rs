use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use crate::error::FetchError;
use crate::stream::{
    DeadlineConfig, FallbackOrchestrator, FallbackPlan, FetchOutcome, FetchRequest, HttpFetcher,
    Record, StreamFetcher,
};

use super::models::{PerfType, Source};

pub const DEFAULT_API_URL: &str = "https://lichess.org/api";

/// Lichess allows at most this many players per leaderboard request.
const MAX_LEADERBOARD: u32 = 200;

/// Client for the Lichess REST and NDJSON endpoints.
#[derive(Clone)]
pub struct LichessClient {
    base_url: Url,
    fetcher: Arc<dyn StreamFetcher>,
    deadline: DeadlineConfig,
}

impl LichessClient {
    /// Client over HTTP using reqwest.
    pub fn new(api_url: &str, deadline: DeadlineConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new()?;
        Self::with_fetcher(api_url, Arc::new(fetcher), deadline)
    }

    pub fn with_fetcher(
        api_url: &str,
        fetcher: Arc<dyn StreamFetcher>,
        deadline: DeadlineConfig,
    ) -> Result<Self> {
        let base_url = Url::parse(api_url)
            .with_context(|| format!("Invalid Lichess API URL: {}", api_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Lichess API URL cannot be used as a base: {}", api_url);
        }
        debug!("Lichess client using {} via {}", base_url, fetcher.name());
        Ok(LichessClient {
            base_url,
            fetcher,
            deadline,
        })
    }

    pub fn deadline(&self) -> DeadlineConfig {
        self.deadline
    }

    // ── NDJSON sources ──────────────────────────────────────────────────────

    /// Which endpoints serve a source, in the order they are tried.
    pub fn plan_for(&self, source: &Source) -> FallbackPlan {
        match source {
            Source::Tournaments => FallbackPlan::new(FetchRequest::ndjson(
                self.endpoint(&["tournament"]),
            ))
            .with_fallback(FetchRequest::ndjson(
                self.endpoint(&["tournament", "arena"]),
            )),
            Source::UserGames { username, max } => {
                let mut url = self.endpoint_url(&["games", "user", username.as_str()]);
                url.query_pairs_mut()
                    .append_pair("max", &max.to_string())
                    .append_pair("pgnInJson", "true");
                FallbackPlan::new(FetchRequest::ndjson(url.to_string()))
            }
        }
    }

    /// Fetch a source, reporting which endpoint served it and its stats.
    pub async fn fetch(&self, source: &Source) -> FetchOutcome {
        let plan = self.plan_for(source);
        let mut orchestrator = FallbackOrchestrator::new(self.fetcher.as_ref(), self.deadline);
        let outcome = orchestrator.run(&plan).await;
        if let FetchOutcome::Success {
            endpoint,
            records,
            stats,
        } = &outcome
        {
            info!(
                "{:?}: {} record(s) from {} endpoint ({} malformed line(s))",
                source,
                records.len(),
                endpoint,
                stats.malformed
            );
        }
        outcome
    }

    /// Ordered records for a source, or a single descriptive error.
    pub async fn fetch_records(&self, source: &Source) -> Result<Vec<Record>, FetchError> {
        self.fetch(source).await.into_result()
    }

    pub async fn fetch_tournaments(&self) -> Result<Vec<Record>, FetchError> {
        self.fetch_records(&Source::Tournaments).await
    }

    pub async fn fetch_user_games(&self, username: &str, max: u32) -> Result<Vec<Record>, FetchError> {
        self.fetch_records(&Source::UserGames {
            username: username.to_string(),
            max,
        })
        .await
    }

    // ── Single-document endpoints (no fallback) ─────────────────────────────

    pub async fn get_user_profile(&self, username: &str) -> Result<Value, FetchError> {
        self.fetch_document(FetchRequest::get(self.endpoint(&["user", username])))
            .await
    }

    /// Top players for a rating category; returns the `users` array.
    pub async fn get_leaderboard(&self, perf: PerfType, count: u32) -> Result<Vec<Value>, FetchError> {
        let count = count.clamp(1, MAX_LEADERBOARD).to_string();
        let doc = self
            .fetch_document(FetchRequest::get(
                self.endpoint(&["player", "top", count.as_str(), perf.key()]),
            ))
            .await?;
        Ok(match doc {
            Value::Object(mut map) => match map.remove("users") {
                Some(Value::Array(users)) => users,
                _ => Vec::new(),
            },
            Value::Array(users) => users,
            _ => Vec::new(),
        })
    }

    /// Online/playing status for a set of users.
    pub async fn get_user_status(&self, ids: &[&str]) -> Result<Value, FetchError> {
        let body = json!({ "ids": ids.join(",") });
        self.fetch_document(FetchRequest::post_json(
            self.endpoint(&["users", "status"]),
            body,
        ))
        .await
    }

    /// Read a whole body under the deadline and parse it as one JSON value.
    async fn fetch_document(&self, request: FetchRequest) -> Result<Value, FetchError> {
        let url = request.url.clone();
        let read = async {
            let open = self.fetcher.open(&request).await?;
            let mut body = open.body;
            let mut bytes = Vec::new();
            while let Some(chunk) = body.next().await {
                bytes.extend(chunk?);
            }
            Ok::<_, FetchError>(bytes)
        };

        let bytes = tokio::time::timeout(self.deadline.duration, read)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.clone(),
                deadline: self.deadline.duration,
            })??;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::InvalidDocument {
            url,
            message: e.to_string(),
        })
    }

    fn endpoint_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        self.endpoint_url(segments).to_string()
    }
}
