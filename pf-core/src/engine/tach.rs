//! Tachometer pulse counting and RPM estimation
//!
//! An edge notifier running on its own thread calls [`PulseCounter::record`]
//! once per falling edge, while the control loop resets the counter at the
//! start of a sampling window and takes the tally at the end. The counter is
//! an `AtomicU64`; taking the tally is a single swap so no edge is lost
//! between reading and resetting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared pulse tally
#[derive(Debug, Default)]
pub struct PulseCounter {
    pulses: AtomicU64,
}

impl PulseCounter {
    pub fn new() -> Self {
        Self {
            pulses: AtomicU64::new(0),
        }
    }

    /// Count one qualifying edge (called from the edge notifier)
    #[inline]
    pub fn record(&self) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
    }

    /// Start a new window
    pub fn reset(&self) {
        self.pulses.store(0, Ordering::Relaxed);
    }

    /// Pulses counted so far in this window
    pub fn read(&self) -> u64 {
        self.pulses.load(Ordering::Relaxed)
    }

    /// Read and reset in one atomic step
    pub fn take(&self) -> u64 {
        self.pulses.swap(0, Ordering::Relaxed)
    }
}

/// Convert a pulse count over an elapsed time to RPM
///
/// `(pulses / pulses_per_revolution) * (60 / elapsed_secs)`, both divisions
/// truncating. Precision is lost for odd pulse counts and for windows that do
/// not divide 60 evenly; windows longer than a minute read 0. An elapsed time
/// of zero yields 0.
pub fn estimate_rpm(pulse_count: u64, elapsed_secs: u64, pulses_per_revolution: u32) -> u32 {
    if elapsed_secs == 0 || pulses_per_revolution == 0 {
        return 0;
    }
    let revolutions = pulse_count / pulses_per_revolution as u64;
    let rpm = revolutions * (60 / elapsed_secs);
    u32::try_from(rpm).unwrap_or(u32::MAX)
}

/// RPM estimator for a fan with a fixed pulses-per-revolution count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpmEstimator {
    pulses_per_revolution: u32,
}

impl RpmEstimator {
    pub fn new(pulses_per_revolution: u32) -> Self {
        Self {
            pulses_per_revolution: pulses_per_revolution.max(1),
        }
    }

    pub fn estimate(&self, pulse_count: u64, elapsed_secs: u64) -> u32 {
        estimate_rpm(pulse_count, elapsed_secs, self.pulses_per_revolution)
    }
}
