//! Liveness probe for an open connection
//!
//! While connected, a ping goes out every `ping_interval`. A reply (or any
//! other inbound frame) must arrive within `pong_timeout`; each probe that
//! goes unanswered counts as a miss, and reaching `missed_limit` misses
//! declares the link dead.

use embassy_time::{Duration, Instant};

/// What the supervisor should do after polling the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Nothing due
    Idle,
    /// Send a ping now
    SendPing,
    /// Too many probes went unanswered; drop the link
    Expired,
}

#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    interval: Duration,
    timeout: Duration,
    missed_limit: u8,
    next_ping_at: Instant,
    awaiting_since: Option<Instant>,
    missed: u8,
}

impl HeartbeatMonitor {
    pub fn new(interval: Duration, timeout: Duration, missed_limit: u8) -> Self {
        Self {
            interval,
            timeout,
            missed_limit: missed_limit.max(1),
            next_ping_at: Instant::from_ticks(0),
            awaiting_since: None,
            missed: 0,
        }
    }

    /// Restart the schedule for a fresh connection
    pub fn reset(&mut self, now: Instant) {
        self.next_ping_at = now + self.interval;
        self.awaiting_since = None;
        self.missed = 0;
    }

    /// Record inbound traffic; any frame proves the peer is alive
    pub fn on_activity(&mut self) {
        self.awaiting_since = None;
        self.missed = 0;
    }

    /// Advance the probe schedule
    pub fn poll(&mut self, now: Instant) -> HeartbeatAction {
        if let Some(sent_at) = self.awaiting_since {
            if now.saturating_duration_since(sent_at) >= self.timeout {
                self.awaiting_since = None;
                self.missed = self.missed.saturating_add(1);
                if self.missed >= self.missed_limit {
                    return HeartbeatAction::Expired;
                }
            }
        }

        if now >= self.next_ping_at {
            self.next_ping_at = now + self.interval;
            if self.awaiting_since.is_none() {
                self.awaiting_since = Some(now);
            }
            return HeartbeatAction::SendPing;
        }

        HeartbeatAction::Idle
    }

    pub fn missed(&self) -> u8 {
        self.missed
    }
}
