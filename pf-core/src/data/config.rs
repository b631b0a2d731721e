//! Configuration management
//!
//! Handles loading and saving the controller configuration as JSON.
//! Every field has a default so partial files are accepted.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{control, default_table, limits, paths, pwm, tach};
use crate::data::types::SpeedTableEntry;
use crate::data::validation::validate_config;
use crate::error::{PifanError, Result};

/// Static configuration of the control loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_table::standard")]
    pub speed_table: Vec<SpeedTableEntry>,
    /// Temperature must fall this far below a tier's threshold before dropping to it
    #[serde(default = "default_hysteresis")]
    pub hysteresis_celsius: f32,
    /// Minimum seconds between accepted speed changes
    #[serde(default = "default_min_dwell_secs")]
    pub min_dwell_secs: u64,
    #[serde(default = "default_ramp_step_percent")]
    pub ramp_step_percent: u8,
    #[serde(default = "default_ramp_step_delay_ms")]
    pub ramp_step_delay_ms: u64,
    #[serde(default = "default_emergency_celsius")]
    pub emergency_celsius: f32,
    /// Whether an emergency change may skip the dwell limiter
    #[serde(default = "default_true")]
    pub emergency_bypasses_dwell: bool,
    #[serde(default = "default_pulses_per_revolution")]
    pub pulses_per_revolution: u32,
    #[serde(default = "default_sample_window_secs")]
    pub sample_window_secs: u64,
    #[serde(default)]
    pub stall: StallConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
}

/// Stalled-fan detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StallConfig {
    #[serde(default = "default_stall_min_percent")]
    pub min_percent: u8,
    #[serde(default = "default_stall_samples")]
    pub consecutive_samples: u32,
}

/// Peripheral bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareConfig {
    #[serde(default = "default_thermal_zone")]
    pub thermal_zone_path: PathBuf,
    #[serde(default = "default_pwm_class")]
    pub pwm_class_path: PathBuf,
    #[serde(default = "default_pwm_chip")]
    pub pwm_chip: u32,
    #[serde(default = "default_pwm_channel")]
    pub pwm_channel: u32,
    #[serde(default = "default_pwm_frequency")]
    pub pwm_frequency_hz: u32,
    #[serde(default = "default_gpio_class")]
    pub gpio_class_path: PathBuf,
    #[serde(default = "default_tach_gpio")]
    pub tach_gpio: u32,
    #[serde(default = "default_true")]
    pub tach_enabled: bool,
}

fn default_hysteresis() -> f32 {
    control::DEFAULT_HYSTERESIS_CELSIUS
}

fn default_min_dwell_secs() -> u64 {
    control::DEFAULT_MIN_DWELL_SECS
}

fn default_ramp_step_percent() -> u8 {
    control::DEFAULT_RAMP_STEP_PERCENT
}

fn default_ramp_step_delay_ms() -> u64 {
    control::DEFAULT_RAMP_STEP_DELAY_MS
}

fn default_emergency_celsius() -> f32 {
    control::DEFAULT_EMERGENCY_CELSIUS
}

fn default_true() -> bool {
    true
}

fn default_pulses_per_revolution() -> u32 {
    tach::DEFAULT_PULSES_PER_REVOLUTION
}

fn default_sample_window_secs() -> u64 {
    tach::DEFAULT_SAMPLE_WINDOW_SECS
}

fn default_stall_min_percent() -> u8 {
    tach::DEFAULT_STALL_MIN_PERCENT
}

fn default_stall_samples() -> u32 {
    tach::DEFAULT_STALL_SAMPLES
}

fn default_thermal_zone() -> PathBuf {
    PathBuf::from(paths::THERMAL_ZONE)
}

fn default_pwm_class() -> PathBuf {
    PathBuf::from(paths::PWM_CLASS)
}

fn default_pwm_chip() -> u32 {
    pwm::DEFAULT_CHIP
}

fn default_pwm_channel() -> u32 {
    pwm::DEFAULT_CHANNEL
}

fn default_pwm_frequency() -> u32 {
    pwm::DEFAULT_FREQUENCY_HZ
}

fn default_gpio_class() -> PathBuf {
    PathBuf::from(paths::GPIO_CLASS)
}

fn default_tach_gpio() -> u32 {
    tach::DEFAULT_GPIO
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            speed_table: default_table::standard(),
            hysteresis_celsius: default_hysteresis(),
            min_dwell_secs: default_min_dwell_secs(),
            ramp_step_percent: default_ramp_step_percent(),
            ramp_step_delay_ms: default_ramp_step_delay_ms(),
            emergency_celsius: default_emergency_celsius(),
            emergency_bypasses_dwell: true,
            pulses_per_revolution: default_pulses_per_revolution(),
            sample_window_secs: default_sample_window_secs(),
            stall: StallConfig::default(),
            hardware: HardwareConfig::default(),
        }
    }
}

impl Default for StallConfig {
    fn default() -> Self {
        Self {
            min_percent: default_stall_min_percent(),
            consecutive_samples: default_stall_samples(),
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            thermal_zone_path: default_thermal_zone(),
            pwm_class_path: default_pwm_class(),
            pwm_chip: default_pwm_chip(),
            pwm_channel: default_pwm_channel(),
            pwm_frequency_hz: default_pwm_frequency(),
            gpio_class_path: default_gpio_class(),
            tach_gpio: default_tach_gpio(),
            tach_enabled: true,
        }
    }
}

impl ControllerConfig {
    pub fn min_dwell(&self) -> Duration {
        Duration::from_secs(self.min_dwell_secs)
    }

    pub fn ramp_step_delay(&self) -> Duration {
        Duration::from_millis(self.ramp_step_delay_ms)
    }

    pub fn sample_window(&self) -> Duration {
        Duration::from_secs(self.sample_window_secs)
    }
}

/// Load and validate the configuration at `path`
///
/// A missing file yields the defaults; an unreadable, unparsable or invalid
/// file is an error.
pub fn load_config_from(path: &Path) -> Result<ControllerConfig> {
    if !path.exists() {
        info!("No config at {}, using defaults", path.display());
        return Ok(ControllerConfig::default());
    }

    let size = fs::metadata(path)
        .map_err(|e| PifanError::FileRead { path: path.to_path_buf(), source: e })?
        .len();
    if size > limits::MAX_CONFIG_SIZE {
        return Err(PifanError::config(format!(
            "{} is too large ({} bytes, max {})",
            path.display(),
            size,
            limits::MAX_CONFIG_SIZE
        )));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| PifanError::FileRead { path: path.to_path_buf(), source: e })?;

    let config: ControllerConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;

    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Validate and write the configuration as pretty JSON
pub fn save_config(config: &ControllerConfig, path: &Path) -> Result<()> {
    validate_config(config)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PifanError::FileWrite { path: parent.to_path_buf(), source: e })?;
    }

    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).map_err(|e| PifanError::FileWrite { path: path.to_path_buf(), source: e })?;

    // Best-effort 0644
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o644));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "min_dwell_secs": 30, "hardware": { "tach_gpio": 25 } }"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.min_dwell_secs, 30);
        assert_eq!(config.hardware.tach_gpio, 25);
        assert_eq!(config.hardware.pwm_frequency_hz, 25_000);
        assert_eq!(config.speed_table, default_table::standard());
        assert!(config.emergency_bypasses_dwell);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = ControllerConfig::default();
        config.emergency_bypasses_dwell = false;
        config.ramp_step_percent = 10;

        save_config(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_table_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "speed_table": [ { "threshold": 50.0, "percent": 40 }, { "threshold": 40.0, "percent": 100 } ] }"#,
        )
        .unwrap();

        assert!(matches!(load_config_from(&path), Err(PifanError::InvalidTable(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(load_config_from(&path), Err(PifanError::JsonParse(_))));
    }
}
