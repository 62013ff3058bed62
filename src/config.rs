use std::time::Duration;

use clap::Parser;

use crate::lichess::{Source, DEFAULT_API_URL};
use crate::stream::DeadlineConfig;

/// Fetch Lichess tournament or game feeds as NDJSON
#[derive(Parser, Debug, Clone)]
#[command(name = "lichess-stream", version, about)]
pub struct Config {
    /// Lichess API base URL
    #[arg(long, env = "LICHESS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Deadline for a streaming fetch in seconds
    #[arg(long, default_value = "10")]
    pub deadline_secs: u64,

    /// Apply the deadline to each chunk read instead of the whole stream
    #[arg(long, default_value = "false")]
    pub per_read_deadline: bool,

    /// Fetch this user's recent games instead of tournaments
    #[arg(long)]
    pub games_for: Option<String>,

    /// Number of games to request with --games-for
    #[arg(long, default_value = "10")]
    pub max_games: u32,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if url::Url::parse(&self.api_url).is_err() {
            anyhow::bail!("api_url is not a valid URL: {}", self.api_url);
        }
        if self.deadline_secs == 0 {
            anyhow::bail!("deadline_secs must be positive");
        }
        if !(1..=300).contains(&self.max_games) {
            anyhow::bail!("max_games must be between 1 and 300");
        }
        if matches!(self.games_for.as_deref(), Some(name) if name.trim().is_empty()) {
            anyhow::bail!("games_for must not be empty");
        }
        Ok(())
    }

    pub fn deadline(&self) -> DeadlineConfig {
        let duration = Duration::from_secs(self.deadline_secs);
        if self.per_read_deadline {
            DeadlineConfig::per_read(duration)
        } else {
            DeadlineConfig::whole_stream(duration)
        }
    }

    pub fn source(&self) -> Source {
        match &self.games_for {
            Some(username) => Source::UserGames {
                username: username.trim().to_string(),
                max: self.max_games,
            },
            None => Source::Tournaments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::DeadlinePolicy;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["lichess-stream"];
        argv.extend_from_slice(args);
        Config::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let c = parse(&["--api-url", DEFAULT_API_URL]);
        assert!(c.validate().is_ok());
        assert_eq!(c.deadline(), DeadlineConfig::default());
        assert_eq!(c.source(), Source::Tournaments);
    }

    #[test]
    fn test_games_source_and_per_read() {
        let c = parse(&[
            "--api-url",
            DEFAULT_API_URL,
            "--games-for",
            "thibault",
            "--max-games",
            "5",
            "--per-read-deadline",
            "--deadline-secs",
            "3",
        ]);
        assert!(c.validate().is_ok());
        assert_eq!(c.deadline().policy, DeadlinePolicy::PerRead);
        assert_eq!(c.deadline().duration, Duration::from_secs(3));
        assert_eq!(
            c.source(),
            Source::UserGames {
                username: "thibault".into(),
                max: 5
            }
        );
    }

    #[test]
    fn test_validate_rejects() {
        assert!(parse(&["--api-url", "nope"]).validate().is_err());
        assert!(parse(&["--api-url", DEFAULT_API_URL, "--deadline-secs", "0"])
            .validate()
            .is_err());
        assert!(parse(&["--api-url", DEFAULT_API_URL, "--max-games", "0"])
            .validate()
            .is_err());
        assert!(parse(&["--api-url", DEFAULT_API_URL, "--games-for", "  "])
            .validate()
            .is_err());
    }
}
