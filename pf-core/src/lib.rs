//! pifan Core Library
//!
//! Closed-loop thermal fan control for single-board computers.
//!
//! # Features
//!
//! - **Speed table**: stepped temperature-to-duty lookup
//! - **Hysteresis and dwell time**: no speed chatter near tier boundaries
//! - **Emergency override**: full speed at a critical temperature
//! - **Ramping**: bounded-step transitions instead of jumps
//! - **Tachometer**: lock-free pulse counting, RPM estimation, stall detection
//! - **Linux bindings**: thermal zone, sysfs PWM and sysfs GPIO
//!
//! # Module Structure
//!
//! - `data/` - Configuration, shared types, validation
//! - `engine/` - Control-decision pipeline and tachometer arithmetic
//! - `hw/` - Peripheral bindings behind the `TemperatureSource`/`DutySink` traits
//!
//! # Example
//!
//! ```no_run
//! use std::time::Instant;
//! use pf_core::{ControllerConfig, Governor};
//!
//! let config = ControllerConfig::default();
//! let governor = Governor::from_config(&config).unwrap();
//! let decision = governor.decide(57.0, 0, Instant::now(), None);
//! assert_eq!(decision.final_target, 55);
//! ```

// Grouped modules
pub mod data;
pub mod engine;
pub mod hw;

// Standalone modules
pub mod constants;
pub mod error;

// Re-export primary types from data/
pub use data::{
    load_config_from, save_config, validate_config, validate_percentage,
    validate_speed_table, ControllerConfig, ControllerState, HardwareConfig, Report,
    SpeedTableEntry, StallConfig,
};

// Re-export error types
pub use error::{PifanError, Result};

// Re-export engine types
pub use engine::{
    estimate_rpm, Decision, DecisionReason, DwellLimiter, EmergencyOverride, Governor,
    HysteresisGate, PulseCounter, RampPlan, Ramper, RpmEstimator, SpeedTable, StallDetector,
    StallStatus,
};

// Re-export hardware bindings from hw/
pub use hw::{read_temperature, DutySink, SysfsPwm, TachInput, TemperatureSource, ThermalZone};
