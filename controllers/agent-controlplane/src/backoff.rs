//! # Requeue Backoff
//!
//! Fibonacci backoff for requeueing failed reconciliations.
//! Grows more slowly than exponential backoff, so a store outage is retried
//! often enough to converge quickly once it clears.
//!
//! Default sequence: 5s, 5s, 10s, 15s, 25s, 40s, ... capped at 5m.

use std::time::Duration;

/// Default first requeue delay
pub const DEFAULT_MIN_SECONDS: u64 = 5;
/// Default requeue delay cap
pub const DEFAULT_MAX_SECONDS: u64 = 300;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, starting at `min_seconds`
/// and capped at `max_seconds`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    prev_seconds: u64,
    current_seconds: u64,
    max_seconds: u64,
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SECONDS, DEFAULT_MAX_SECONDS)
    }
}

impl FibonacciBackoff {
    /// Create a new backoff with the given bounds in seconds
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            prev_seconds: 0,
            current_seconds: min_seconds,
            max_seconds,
        }
    }

    /// Next delay, advancing the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current_seconds;
        let next = self.prev_seconds.saturating_add(self.current_seconds);
        self.prev_seconds = self.current_seconds;
        self.current_seconds = next.min(self.max_seconds);
        Duration::from_secs(result)
    }
}
