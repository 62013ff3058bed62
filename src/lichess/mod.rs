pub mod client;
pub mod models;
pub mod tournament;

pub use client::{LichessClient, DEFAULT_API_URL};
pub use models::{PerfType, Source};
pub use tournament::{summarize, TournamentStatus, TournamentSummary};
