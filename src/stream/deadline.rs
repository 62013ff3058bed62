use std::time::Duration;

use tokio::time::Instant;

/// Default deadline for tournament and game streams.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// What the deadline bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeadlinePolicy {
    /// One deadline for the whole fetch: connect plus every read.
    #[default]
    WholeStream,
    /// Every wait step (connect, then each next-chunk read) gets the full
    /// duration. A slow but steady stream never times out.
    PerRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineConfig {
    pub duration: Duration,
    pub policy: DeadlinePolicy,
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        DeadlineConfig {
            duration: DEFAULT_DEADLINE,
            policy: DeadlinePolicy::WholeStream,
        }
    }
}

impl DeadlineConfig {
    pub fn whole_stream(duration: Duration) -> Self {
        DeadlineConfig {
            duration,
            policy: DeadlinePolicy::WholeStream,
        }
    }

    pub fn per_read(duration: Duration) -> Self {
        DeadlineConfig {
            duration,
            policy: DeadlinePolicy::PerRead,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Idle,
    Armed,
    Disarmed,
    Fired,
}

/// Cancellation handle owned by one stream session.
///
/// Armed once, then either disarmed (stream finished) or fired (deadline
/// hit). Both are terminal; a late `fire` after `disarm` is ignored.
#[derive(Debug)]
pub struct DeadlineToken {
    config: DeadlineConfig,
    state: TokenState,
    /// Fixed instant under `WholeStream`, unused under `PerRead`
    overall: Option<Instant>,
}

impl DeadlineToken {
    pub fn new(config: DeadlineConfig) -> Self {
        DeadlineToken {
            config,
            state: TokenState::Idle,
            overall: None,
        }
    }

    pub fn arm(&mut self) {
        if self.state != TokenState::Idle {
            return;
        }
        self.state = TokenState::Armed;
        if self.config.policy == DeadlinePolicy::WholeStream {
            self.overall = Some(Instant::now() + self.config.duration);
        }
    }

    /// Deadline for the wait step that is about to start.
    pub fn step_deadline(&self) -> Instant {
        match (self.config.policy, self.overall) {
            (DeadlinePolicy::WholeStream, Some(at)) => at,
            _ => Instant::now() + self.config.duration,
        }
    }

    /// Mark the deadline as hit. Returns false if the token was already
    /// disarmed or fired, in which case nothing changes.
    pub fn fire(&mut self) -> bool {
        if self.state != TokenState::Armed {
            return false;
        }
        self.state = TokenState::Fired;
        true
    }

    pub fn disarm(&mut self) {
        if matches!(self.state, TokenState::Idle | TokenState::Armed) {
            self.state = TokenState::Disarmed;
        }
    }

    pub fn state(&self) -> TokenState {
        self.state
    }

    pub fn duration(&self) -> Duration {
        self.config.duration
    }

    pub fn policy(&self) -> DeadlinePolicy {
        self.config.policy
    }
}
