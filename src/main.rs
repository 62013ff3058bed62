use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use lichess_stream::config::Config;
use lichess_stream::lichess::{summarize, LichessClient, Source};
use lichess_stream::stream::FetchOutcome;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    let deadline = config.deadline();
    info!(
        "Using {} (deadline {:?}, {:?})",
        config.api_url, deadline.duration, deadline.policy
    );

    let client = LichessClient::new(&config.api_url, deadline)?;
    let source = config.source();

    let (endpoint, records, stats) = match client.fetch(&source).await {
        FetchOutcome::Success {
            endpoint,
            records,
            stats,
        } => (endpoint, records, stats),
        FetchOutcome::Failure(e) => {
            return Err(e).with_context(|| format!("Failed to fetch {:?}", source));
        }
    };

    if stats.all_lines_invalid() {
        warn!(
            "Every line from the {} endpoint was malformed ({} line(s))",
            endpoint, stats.lines
        );
    }

    match source {
        Source::Tournaments => {
            let tournaments = summarize(records);
            info!("{} tournament(s) to show", tournaments.len());
            for t in &tournaments {
                info!(
                    "{} [{}] {} {} - {} players",
                    t.full_name,
                    t.variant,
                    t.time_control(),
                    t.duration_label().unwrap_or_default(),
                    t.nb_players
                );
                println!("{}", serde_json::to_string(t)?);
            }
        }
        Source::UserGames { username, .. } => {
            info!("{} game(s) for {}", records.len(), username);
            for game in &records {
                println!("{}", serde_json::to_string(game)?);
            }
        }
    }

    Ok(())
}
