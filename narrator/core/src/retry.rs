//! Stream Reconnect Policy
//!
//! Pure arithmetic for the connecting phase of a stream: how many attempts
//! are allowed, how long each may take, and how long to wait between them.
//! Nothing here touches a transport.

use std::time::Duration;

/// Retry policy for opening a stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connection attempts, including the first
    pub max_attempts: u32,
    /// Interval multiplied by the attempt number
    pub base_interval: Duration,
    /// Cap on any single delay
    pub max_delay: Duration,
    /// How long one attempt may wait for the transport to open
    pub connect_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_interval: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            connect_timeout: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before reconnecting after the `failures`-th failed attempt
    ///
    /// `failures` is 1-based: the first failure waits one base interval,
    /// the second two, and so on, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, failures: u32) -> Duration {
        self.base_interval
            .saturating_mul(failures.max(1))
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `failures` failed attempts
    #[must_use]
    pub fn should_retry(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }
}
