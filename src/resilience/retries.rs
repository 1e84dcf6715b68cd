//! Retry budget for backend reachability probes.
//!
//! # Responsibilities
//! - Hold the total time budget and the fixed delay between attempts
//! - Decide whether another attempt is allowed
//!
//! # Design Decisions
//! - Fixed interval, no jitter: probes target a single local backend
//! - The budget is measured from the start of the sequence, so the final
//!   verdict arrives no earlier than `max_retry`
//! - Each attempt carries its own short timeout

use std::time::Duration;

/// Timeout for a single connect attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(100);

/// Time-bounded, fixed-interval retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total budget for one probe sequence.
    pub max_retry: Duration,
    /// Delay between failed attempts.
    pub interval: Duration,
    /// Timeout for each attempt.
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_retry: Duration, interval: Duration) -> Self {
        Self {
            max_retry,
            interval,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Build from the millisecond values used in configuration files.
    pub fn from_millis(max_retry_ms: u64, retry_interval_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(max_retry_ms),
            Duration::from_millis(retry_interval_ms),
        )
    }

    /// Whether another attempt may start after `elapsed` has been spent.
    pub fn should_retry(&self, elapsed: Duration) -> bool {
        elapsed < self.max_retry
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(1000, 50)
    }
}
