//! Bounded-step ramping between duty cycles

use std::time::Duration;

/// Step size and inter-step delay for duty-cycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramper {
    step: u8,
    step_delay: Duration,
}

impl Ramper {
    /// Create a ramper; a zero step is raised to 1 so every plan terminates
    pub fn new(step: u8, step_delay: Duration) -> Self {
        Self {
            step: step.max(1),
            step_delay,
        }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    /// Delay between consecutive writes (not after the last one)
    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    pub fn plan(&self, current: u8, target: u8) -> RampPlan {
        RampPlan::new(current, target, self.step)
    }
}

/// Sequence of duty values to write when moving from `current` to `target`
///
/// Yields `ceil(|target - current| / step)` values; the last is exactly
/// `target` and none overshoot it. Empty when `current == target`.
#[derive(Debug, Clone)]
pub struct RampPlan {
    position: u8,
    target: u8,
    step: u8,
}

impl RampPlan {
    pub fn new(current: u8, target: u8, step: u8) -> Self {
        Self {
            position: current,
            target,
            step: step.max(1),
        }
    }

    /// Number of writes remaining
    pub fn remaining(&self) -> usize {
        let distance = self.position.abs_diff(self.target) as usize;
        distance.div_ceil(self.step as usize)
    }
}

impl Iterator for RampPlan {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.position == self.target {
            return None;
        }

        self.position = if self.target > self.position {
            self.position.saturating_add(self.step).min(self.target)
        } else {
            self.position.saturating_sub(self.step).max(self.target)
        };
        Some(self.position)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RampPlan {}
