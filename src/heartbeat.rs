//! Keep-alive scheduling.
//!
//! Acaia scales end the session when they stop hearing from the central, so
//! OLD and NEW sessions send a heartbeat frame at least once per period.
//! GENERIC scales have no such requirement.

use std::time::Duration;

use tokio::time::Instant;

use crate::constants::DEFAULT_HEARTBEAT_PERIOD;
use crate::variant::Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatScheduler {
    period: Duration,
}

impl Default for HeartbeatScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_PERIOD)
    }
}

impl HeartbeatScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether a heartbeat should be sent at `now`.
    ///
    /// `last` is `None` when no heartbeat has been sent yet in this session,
    /// which makes one due straight away.
    pub fn is_due(&self, variant: Variant, last: Option<Instant>, now: Instant) -> bool {
        if !variant.needs_heartbeat() {
            return false;
        }
        match last {
            Some(last) => now.saturating_duration_since(last) >= self.period,
            None => true,
        }
    }
}
