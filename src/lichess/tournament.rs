//! Consumer-side view of tournament records.
//!
//! The stream parser accepts any JSON value; this is where tournament shape
//! is checked. Records without `id` or `fullName` are dropped, missing
//! variant and clock fall back to defaults.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::stream::Record;

/// At most this many tournaments are listed.
pub const MAX_LISTED_TOURNAMENTS: usize = 20;

const LISTING_GROUPS: [&str; 3] = ["created", "started", "finished"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Created,
    Started,
    Finished,
    Unknown,
}

impl TournamentStatus {
    fn from_value(v: &serde_json::Value) -> Self {
        // the listing sends either the name or lichess's numeric code
        match (v.as_str(), v.as_i64()) {
            (Some("created"), _) | (_, Some(10)) => TournamentStatus::Created,
            (Some("started"), _) | (_, Some(20)) => TournamentStatus::Started,
            (Some("finished"), _) | (_, Some(30)) => TournamentStatus::Finished,
            _ => TournamentStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentSummary {
    pub id: String,
    pub full_name: String,
    pub status: TournamentStatus,
    pub variant: String,
    /// Initial clock in seconds
    pub clock_limit: u64,
    /// Increment in seconds
    pub clock_increment: u64,
    pub minutes: Option<u64>,
    pub nb_players: u64,
    pub starts_at: Option<DateTime<Utc>>,
    pub finishes_at: Option<DateTime<Utc>>,
    pub winner: Option<String>,
}

impl TournamentSummary {
    /// `None` when the record lacks `id` or `fullName`.
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = non_empty_str(&record["id"])?;
        let full_name = non_empty_str(&record["fullName"])?;

        Some(TournamentSummary {
            id,
            full_name,
            status: TournamentStatus::from_value(&record["status"]),
            variant: non_empty_str(&record["variant"]["name"])
                .or_else(|| non_empty_str(&record["variant"]))
                .unwrap_or_else(|| "Unknown".to_string()),
            clock_limit: record["clock"]["limit"].as_u64().unwrap_or(0),
            clock_increment: record["clock"]["increment"].as_u64().unwrap_or(0),
            minutes: record["minutes"].as_u64(),
            nb_players: record["nbPlayers"].as_u64().unwrap_or(0),
            starts_at: epoch_millis(&record["startsAt"]),
            finishes_at: epoch_millis(&record["finishesAt"]),
            winner: non_empty_str(&record["winner"]["name"]),
        })
    }

    /// e.g. "3+2" for a 180s clock with 2s increment.
    pub fn time_control(&self) -> String {
        format!("{}+{}", self.clock_limit / 60, self.clock_increment)
    }

    /// e.g. "1h 30m" or "45m".
    pub fn duration_label(&self) -> Option<String> {
        let minutes = self.minutes.filter(|m| *m > 0)?;
        let (hours, mins) = (minutes / 60, minutes % 60);
        Some(if hours > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}m", mins)
        })
    }

    pub fn lichess_url(&self) -> String {
        format!("https://lichess.org/tournament/{}", self.id)
    }
}

/// Expand grouped listing documents (`{created, started, finished}`) into
/// their members, in that group order. Other records pass through untouched.
pub fn flatten_listing(records: Vec<Record>) -> Vec<Record> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let is_listing = LISTING_GROUPS.iter().any(|g| record[*g].is_array());
        if !is_listing {
            out.push(record);
            continue;
        }
        for group in LISTING_GROUPS {
            if let Some(items) = record[group].as_array() {
                debug!("Listing group '{}': {} tournament(s)", group, items.len());
                out.extend(items.iter().cloned());
            }
        }
    }
    out
}

/// Flatten, validate, and cap a tournament feed for display.
pub fn summarize(records: Vec<Record>) -> Vec<TournamentSummary> {
    flatten_listing(records)
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let summary = TournamentSummary::from_record(record);
            if summary.is_none() {
                debug!("Skipping tournament record {} without id/fullName", i);
            }
            summary
        })
        .take(MAX_LISTED_TOURNAMENTS)
        .collect()
}

fn non_empty_str(v: &serde_json::Value) -> Option<String> {
    v.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

fn epoch_millis(v: &serde_json::Value) -> Option<DateTime<Utc>> {
    let ms = v.as_i64()?;
    DateTime::from_timestamp_millis(ms)
}
