//! Fan control engine modules
//!
//! Contains the control-decision pipeline and the tachometer arithmetic.

mod dwell;
mod emergency;
mod governor;
mod hysteresis;
mod ramp;
mod stall;
mod table;
mod tach;

pub use dwell::DwellLimiter;
pub use emergency::EmergencyOverride;
pub use governor::{Decision, DecisionReason, Governor};
pub use hysteresis::HysteresisGate;
pub use ramp::{RampPlan, Ramper};
pub use stall::{StallDetector, StallStatus};
pub use table::SpeedTable;
pub use tach::{estimate_rpm, PulseCounter, RpmEstimator};
