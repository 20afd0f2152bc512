//! Shared session configuration.

use std::time::Duration;

/// Subject text sent to the oracle when no requirement file is available.
pub const FALLBACK_SUBJECT: &str = "User data will be stored indefinitely on public servers.";

/// Display ceiling for the progress bar.
pub const DEFAULT_TOTAL_ROUNDS: u32 = 5;

/// Negotiation round bound sent with every alignment request.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Period of the turn-alternation animation while an oracle call is in flight.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(600);

/// Tunables for one debate session.
///
/// `total_rounds` only drives the progress display and is independent of
/// `max_iterations`, which bounds the oracle's negotiation loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub total_rounds: u32,
    pub max_iterations: u32,
    pub tick_interval: Duration,
    pub fallback_subject: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tick_interval: DEFAULT_TICK_INTERVAL,
            fallback_subject: FALLBACK_SUBJECT.to_string(),
        }
    }
}
