//! Streaming ingestion of Lichess NDJSON feeds.
//!
//! Tournament listings and game histories arrive as newline-delimited JSON
//! over a chunked HTTP body. Each fetch runs the body through an incremental
//! UTF-8 decoder, a line framer and a per-line JSON parser, under a deadline
//! that cancels the read, with a secondary endpoint tried when the primary
//! fails.
//!
//! ```no_run
//! use lichess_stream::lichess::{LichessClient, DEFAULT_API_URL};
//! use lichess_stream::stream::DeadlineConfig;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let client = LichessClient::new(DEFAULT_API_URL, DeadlineConfig::default())?;
//! let tournaments = client.fetch_tournaments().await?;
//! println!("{} tournaments", tournaments.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lichess;
pub mod stream;

pub use error::{DecodeError, FetchError, ParseError, SourceFailure};
