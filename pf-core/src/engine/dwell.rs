//! Minimum dwell time between accepted speed changes

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellLimiter {
    min_dwell: Duration,
}

impl DwellLimiter {
    pub fn new(min_dwell: Duration) -> Self {
        Self { min_dwell }
    }

    /// Whether enough time has passed since the last accepted change
    ///
    /// Always true before the first change.
    pub fn is_settled(&self, now: Instant, last_change: Option<Instant>) -> bool {
        match last_change {
            Some(last) => now.saturating_duration_since(last) >= self.min_dwell,
            None => true,
        }
    }

    /// Final target after rate limiting
    ///
    /// A change inside the dwell window is deferred (the current value is
    /// kept); it is re-evaluated on the next tick.
    pub fn limit(&self, candidate: u8, current: u8, now: Instant, last_change: Option<Instant>) -> u8 {
        if candidate != current && !self.is_settled(now, last_change) {
            current
        } else {
            candidate
        }
    }
}
