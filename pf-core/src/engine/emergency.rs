//! Critical-temperature override

use crate::constants::duty;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmergencyOverride {
    threshold: f32,
    bypasses_dwell: bool,
}

impl EmergencyOverride {
    pub fn new(threshold: f32, bypasses_dwell: bool) -> Self {
        Self {
            threshold,
            bypasses_dwell,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Whether an emergency change skips the dwell limiter
    ///
    /// With `false` a change made shortly before the temperature spike can
    /// hold the fan below full speed for up to the dwell time.
    pub fn bypasses_dwell(&self) -> bool {
        self.bypasses_dwell
    }

    pub fn is_triggered(&self, temperature: f32) -> bool {
        temperature >= self.threshold
    }

    /// Forced target, if the temperature is critical
    pub fn apply(&self, temperature: f32) -> Option<u8> {
        self.is_triggered(temperature).then_some(duty::MAX_PERCENT)
    }
}
