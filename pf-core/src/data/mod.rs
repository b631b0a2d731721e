//! Data types, configuration, and validation modules
//!
//! Contains all core data structures and configuration management.

mod config;
mod types;
mod validation;

pub use config::{
    load_config_from, save_config, ControllerConfig, HardwareConfig, StallConfig,
};
pub use types::{ControllerState, Report, SpeedTableEntry};
pub use validation::{validate_config, validate_percentage, validate_speed_table};
