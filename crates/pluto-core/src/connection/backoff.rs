//! Reconnect delay policy

use embassy_time::Duration;

/// How long to wait before retrying a failed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Same delay after every failure
    Fixed(Duration),
    /// `initial * 2^failures`, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed(Duration::from_millis(5_000))
    }
}

/// Failure counter feeding a [`ReconnectPolicy`]
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    consecutive_failures: u32,
}

impl Backoff {
    pub const fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            consecutive_failures: 0,
        }
    }

    /// Delay to apply for the failure just recorded, then bump the counter
    pub fn next_delay(&mut self) -> Duration {
        let delay = match self.policy {
            ReconnectPolicy::Fixed(delay) => delay,
            ReconnectPolicy::Exponential { initial, max } => {
                // 1x, 2x, 4x ... saturating well before overflow
                let shift = self.consecutive_failures.min(16);
                let scaled = initial.as_millis().saturating_mul(1u64 << shift);
                Duration::from_millis(scaled.min(max.as_millis()))
            }
        };
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        delay
    }

    /// Forget past failures after a successful connect
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
