//! Constants and configuration values for pifan
//!
//! Centralizes all magic numbers, paths, and configuration defaults.
//! Never use magic numbers in other files - add them here first.

use std::time::Duration;

/// System paths
pub mod paths {
    use std::path::PathBuf;

    /// System configuration directory
    pub const CONFIG_DIR: &str = "/etc/pifan";

    /// Controller configuration file
    pub const CONFIG_FILE: &str = "config.json";

    /// CPU thermal zone (millidegrees Celsius)
    pub const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

    /// Linux PWM class
    pub const PWM_CLASS: &str = "/sys/class/pwm";

    /// Linux sysfs GPIO class
    pub const GPIO_CLASS: &str = "/sys/class/gpio";

    /// Default configuration path.
    ///
    /// The daemon runs as root and reads `/etc/pifan/config.json`. When run
    /// unprivileged (development), the user's config dir is used instead.
    pub fn default_config_path() -> PathBuf {
        // SAFETY: geteuid is always safe - it just returns the effective user ID of the process.
        let is_root = unsafe { libc::geteuid() } == 0;
        if !is_root {
            if let Some(dir) = dirs::config_dir() {
                let user_path = dir.join("pifan").join(CONFIG_FILE);
                if user_path.exists() {
                    return user_path;
                }
            }
        }
        PathBuf::from(CONFIG_DIR).join(CONFIG_FILE)
    }
}

/// Duty cycle constants
pub mod duty {
    /// Minimum duty cycle (fan off)
    pub const MIN_PERCENT: u8 = 0;

    /// Maximum duty cycle (full speed)
    pub const MAX_PERCENT: u8 = 100;

    /// Maximum value of an 8-bit PWM duty register
    pub const BYTE_MAX: u8 = 255;

    /// Convert a percentage (0-100) to an 8-bit duty value (0-255)
    ///
    /// Truncates like `(int)((percent / 100.0) * 255)`.
    #[inline]
    pub fn to_byte(percent: u8) -> u8 {
        let percent = percent.min(MAX_PERCENT);
        ((percent as f32 / 100.0) * BYTE_MAX as f32) as u8
    }

    /// Nanoseconds of high time for `percent` of a PWM period
    #[inline]
    pub fn to_duty_ns(period_ns: u64, percent: u8) -> u64 {
        period_ns * percent.min(MAX_PERCENT) as u64 / 100
    }
}

/// Temperature constants
pub mod temperature {
    /// Temperature readings are in millidegrees, divide by this to get Celsius
    pub const MILLIDEGREE_DIVISOR: f32 = 1000.0;

    /// Value substituted when the sensor cannot be read.
    ///
    /// Lies below every table threshold, so it resolves to the lowest tier.
    pub const SENSOR_FAILURE_CELSIUS: f32 = -1.0;
}

/// PWM output defaults
pub mod pwm {
    /// PWM frequency for 4-pin PC fans (Intel spec: 21-28 kHz)
    pub const DEFAULT_FREQUENCY_HZ: u32 = 25_000;

    /// Default PWM chip number
    pub const DEFAULT_CHIP: u32 = 0;

    /// Default PWM channel on the chip
    pub const DEFAULT_CHANNEL: u32 = 0;

    /// Nanoseconds per second
    pub const NANOS_PER_SEC: u64 = 1_000_000_000;

    /// Period in nanoseconds for a frequency in Hz
    #[inline]
    pub fn period_ns(frequency_hz: u32) -> u64 {
        NANOS_PER_SEC / frequency_hz.max(1) as u64
    }
}

/// sysfs class device handling
pub mod sysfs {
    /// Time to wait for udev to fix up permissions after export
    pub const EXPORT_SETTLE_MS: u64 = 100;
}

/// Tachometer defaults
pub mod tach {
    use super::*;

    /// Default tachometer GPIO (BCM numbering)
    pub const DEFAULT_GPIO: u32 = 17;

    /// Standard PC fans emit two pulses per revolution
    pub const DEFAULT_PULSES_PER_REVOLUTION: u32 = 2;

    /// Default RPM sampling window in seconds
    pub const DEFAULT_SAMPLE_WINDOW_SECS: u64 = 2;

    /// Upper bound on the sampling window
    pub const MAX_SAMPLE_WINDOW_SECS: u64 = 60;

    /// poll() timeout so the edge thread notices stop requests
    pub const POLL_TIMEOUT: Duration = Duration::from_millis(200);

    /// Default duty at or above which a zero reading counts towards a stall
    pub const DEFAULT_STALL_MIN_PERCENT: u8 = 30;

    /// Default consecutive zero-RPM samples before declaring a stall
    pub const DEFAULT_STALL_SAMPLES: u32 = 3;
}

/// Control loop parameters
pub mod control {
    /// Default hysteresis margin in °C
    pub const DEFAULT_HYSTERESIS_CELSIUS: f32 = 2.0;

    /// Largest accepted hysteresis margin in °C
    pub const MAX_HYSTERESIS_CELSIUS: f32 = 20.0;

    /// Default minimum time between accepted speed changes
    pub const DEFAULT_MIN_DWELL_SECS: u64 = 10;

    /// Default ramp step in percent
    pub const DEFAULT_RAMP_STEP_PERCENT: u8 = 5;

    /// Default delay between ramp steps
    pub const DEFAULT_RAMP_STEP_DELAY_MS: u64 = 100;

    /// Largest accepted delay between ramp steps
    pub const MAX_RAMP_STEP_DELAY_MS: u64 = 10_000;

    /// Default emergency temperature in °C
    pub const DEFAULT_EMERGENCY_CELSIUS: f32 = 80.0;

    /// Consecutive sensor failures between repeated warnings
    pub const SENSOR_FAILURE_LOG_EVERY: u32 = 10;
}

/// Limits for user-supplied configuration
pub mod limits {
    /// Maximum configuration file size
    pub const MAX_CONFIG_SIZE: u64 = 64 * 1024;

    /// Maximum number of speed table entries
    pub const MAX_TABLE_ENTRIES: usize = 32;
}

/// Default speed table
pub mod default_table {
    use crate::data::SpeedTableEntry;

    /// Stepped table for a 5 V Noctua-class fan on a Raspberry Pi.
    ///
    /// The 999 °C entry is the "above everything" sentinel.
    pub fn standard() -> Vec<SpeedTableEntry> {
        vec![
            SpeedTableEntry { threshold: 45.0, percent: 0 },
            SpeedTableEntry { threshold: 50.0, percent: 20 },
            SpeedTableEntry { threshold: 55.0, percent: 35 },
            SpeedTableEntry { threshold: 60.0, percent: 55 },
            SpeedTableEntry { threshold: 65.0, percent: 70 },
            SpeedTableEntry { threshold: 70.0, percent: 85 },
            SpeedTableEntry { threshold: 999.0, percent: 100 },
        ]
    }
}
