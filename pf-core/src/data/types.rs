//! Core data types for pifan
//!
//! Defines the primary data structures shared by the engine and the daemon.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// One row of the temperature-to-duty speed table
///
/// Entries are ordered by strictly increasing `threshold`; the last entry is a
/// sentinel covering everything above the named thresholds and maps to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedTableEntry {
    /// Upper temperature bound of this tier in °C (inclusive)
    pub threshold: f32,
    /// Duty cycle for this tier (0-100)
    pub percent: u8,
}

/// Mutable control state, owned by the controller and changed once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    /// Duty cycle currently commanded on the physical output
    pub applied_percent: u8,
    /// When the last accepted change finished ramping (None before the first)
    pub last_change_time: Option<Instant>,
}

impl ControllerState {
    pub fn new() -> Self {
        Self {
            applied_percent: 0,
            last_change_time: None,
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-sample observation emitted by the control loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Report {
    /// Temperature used for the decision (°C)
    pub temperature: f32,
    /// Duty cycle after the tick (0-100)
    pub applied_percent: u8,
    /// Measured fan speed, None when no tachometer is wired
    pub rpm: Option<u32>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temp: {:.1}°C | Fan: {}% | RPM: ",
            self.temperature, self.applied_percent
        )?;
        match self.rpm {
            Some(rpm) => write!(f, "{}", rpm),
            None => write!(f, "n/a"),
        }
    }
}
