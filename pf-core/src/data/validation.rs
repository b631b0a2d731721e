//! Configuration validation for pifan
//!
//! Checks run once at load time; the control loop assumes a valid config.

use tracing::warn;

use crate::constants::{control, duty, limits, tach};
use crate::data::config::ControllerConfig;
use crate::data::types::SpeedTableEntry;
use crate::error::{PifanError, Result};

/// Validates that a percentage is within the valid range (0-100)
pub fn validate_percentage(value: i32) -> Result<u8> {
    if !(0..=duty::MAX_PERCENT as i32).contains(&value) {
        return Err(PifanError::InvalidPercentage { value });
    }
    Ok(value as u8)
}

/// Validates the speed table invariants
///
/// - at least one entry, at most `MAX_TABLE_ENTRIES`
/// - thresholds finite and strictly increasing
/// - percents within 0-100 and non-decreasing
/// - the final (sentinel) entry maps to 100
///
/// Repeated percents are accepted with a warning: the hysteresis reverse
/// lookup uses the first entry with a given percent.
pub fn validate_speed_table(table: &[SpeedTableEntry]) -> Result<()> {
    if table.is_empty() {
        return Err(PifanError::InvalidTable("table must have at least one entry".into()));
    }
    if table.len() > limits::MAX_TABLE_ENTRIES {
        return Err(PifanError::InvalidTable(format!(
            "too many entries ({}, max {})",
            table.len(),
            limits::MAX_TABLE_ENTRIES
        )));
    }

    for entry in table {
        if !entry.threshold.is_finite() {
            return Err(PifanError::InvalidTable("threshold must be finite".into()));
        }
        validate_percentage(entry.percent as i32)
            .map_err(|_| PifanError::InvalidTable(format!("percent {} out of range", entry.percent)))?;
    }

    for pair in table.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        if upper.threshold <= lower.threshold {
            return Err(PifanError::InvalidTable(format!(
                "thresholds must be strictly increasing ({} after {})",
                upper.threshold, lower.threshold
            )));
        }
        if upper.percent < lower.percent {
            return Err(PifanError::InvalidTable(format!(
                "percent must not decrease ({}% at {}°C after {}% at {}°C)",
                upper.percent, upper.threshold, lower.percent, lower.threshold
            )));
        }
        if upper.percent == lower.percent {
            warn!(
                "Speed table repeats {}% at {}°C and {}°C; drops to {}% need the temperature below {}°C minus hysteresis",
                lower.percent, lower.threshold, upper.threshold, lower.percent, lower.threshold
            );
        }
    }

    if let Some(last) = table.last() {
        if last.percent != duty::MAX_PERCENT {
            return Err(PifanError::InvalidTable(format!(
                "final entry must map to 100% (got {}%)",
                last.percent
            )));
        }
    }

    Ok(())
}

/// Validates a complete controller configuration
pub fn validate_config(config: &ControllerConfig) -> Result<()> {
    validate_speed_table(&config.speed_table)?;

    if !config.hysteresis_celsius.is_finite()
        || !(0.0..=control::MAX_HYSTERESIS_CELSIUS).contains(&config.hysteresis_celsius)
    {
        return Err(PifanError::invalid_config(
            "hysteresis_celsius",
            format!("must be between 0 and {}", control::MAX_HYSTERESIS_CELSIUS),
        ));
    }
    if config.ramp_step_percent == 0 || config.ramp_step_percent > duty::MAX_PERCENT {
        return Err(PifanError::invalid_config("ramp_step_percent", "must be between 1 and 100"));
    }
    if config.ramp_step_delay_ms > control::MAX_RAMP_STEP_DELAY_MS {
        return Err(PifanError::invalid_config(
            "ramp_step_delay_ms",
            format!("must be at most {}", control::MAX_RAMP_STEP_DELAY_MS),
        ));
    }
    if !config.emergency_celsius.is_finite() {
        return Err(PifanError::invalid_config("emergency_celsius", "must be finite"));
    }
    if config.pulses_per_revolution == 0 {
        return Err(PifanError::invalid_config("pulses_per_revolution", "must be at least 1"));
    }
    if config.sample_window_secs == 0 || config.sample_window_secs > tach::MAX_SAMPLE_WINDOW_SECS {
        return Err(PifanError::invalid_config(
            "sample_window_secs",
            format!("must be between 1 and {}", tach::MAX_SAMPLE_WINDOW_SECS),
        ));
    }
    if config.stall.min_percent > duty::MAX_PERCENT {
        return Err(PifanError::invalid_config("stall.min_percent", "must be at most 100"));
    }
    if config.stall.consecutive_samples == 0 {
        return Err(PifanError::invalid_config("stall.consecutive_samples", "must be at least 1"));
    }
    if config.hardware.pwm_frequency_hz == 0 {
        return Err(PifanError::invalid_config("hardware.pwm_frequency_hz", "must be non-zero"));
    }

    Ok(())
}
