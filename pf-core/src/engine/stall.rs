//! Stalled-fan detection from RPM samples
//!
//! Observational only: the detector never changes the duty cycle.

use crate::data::StallConfig;

/// Transition reported by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallStatus {
    /// Spinning, or not commanded fast enough to judge
    Ok,
    /// Zero RPM seen but not yet for enough consecutive samples
    Suspect,
    /// Entered the stalled state on this sample
    Stalled,
    /// Still stalled (already reported), including zero-RPM samples at a
    /// duty too low to judge
    StillStalled,
    /// Left the stalled state on this sample
    Recovered,
}

#[derive(Debug, Clone)]
pub struct StallDetector {
    min_percent: u8,
    required_samples: u32,
    zero_samples: u32,
    stalled: bool,
}

impl StallDetector {
    pub fn new(config: &StallConfig) -> Self {
        Self {
            min_percent: config.min_percent,
            required_samples: config.consecutive_samples.max(1),
            zero_samples: 0,
            stalled: false,
        }
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Feed one sample
    ///
    /// Only a non-zero RPM ends a stall. A zero reading at a duty too low to
    /// judge leaves the state as it was.
    pub fn observe(&mut self, applied_percent: u8, rpm: u32) -> StallStatus {
        if rpm > 0 {
            self.zero_samples = 0;
            if self.stalled {
                self.stalled = false;
                return StallStatus::Recovered;
            }
            return StallStatus::Ok;
        }

        if self.stalled {
            return StallStatus::StillStalled;
        }

        if applied_percent == 0 || applied_percent < self.min_percent {
            self.zero_samples = 0;
            return StallStatus::Ok;
        }

        self.zero_samples = self.zero_samples.saturating_add(1);
        if self.zero_samples >= self.required_samples {
            self.stalled = true;
            StallStatus::Stalled
        } else {
            StallStatus::Suspect
        }
    }
}
