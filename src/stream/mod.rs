pub mod deadline;
pub mod decoder;
pub mod fallback;
pub mod fetcher;
pub mod framer;
pub mod parser;
pub mod pipeline;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use deadline::{DeadlineConfig, DeadlinePolicy, DeadlineToken, DEFAULT_DEADLINE};
pub use decoder::Utf8Decoder;
pub use fallback::{Endpoint, FallbackOrchestrator, FallbackPlan, FallbackState, FetchOutcome};
pub use fetcher::{ByteStream, FetchRequest, HttpFetcher, OpenStream, StreamFetcher};
pub use framer::LineFramer;
pub use parser::{parse_line, Record, RecordParser};
pub use pipeline::Pipeline;
pub use session::{SessionReport, SessionState, SessionStats, StreamSession};
