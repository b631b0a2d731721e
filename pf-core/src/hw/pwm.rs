//! Linux sysfs PWM output
//!
//! Drives one channel of `/sys/class/pwm/pwmchipN`:
//!
//! - `export`: makes `pwmM/` appear
//! - `pwmM/period`: period in nanoseconds (25 kHz = 40000 ns)
//! - `pwmM/duty_cycle`: high time in nanoseconds, never above `period`
//! - `pwmM/enable`: 1 = output on
//!
//! On the Raspberry Pi the channel needs `dtoverlay=pwm` (GPIO18 = channel 0).
//! Dropping a [`SysfsPwm`] stops the fan and releases the channel, so every
//! exit path leaves the output off.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::constants::{duty, pwm, sysfs};
use crate::error::{PifanError, Result};

use super::DutySink;

#[derive(Debug)]
pub struct SysfsPwm {
    chip_dir: PathBuf,
    channel_dir: PathBuf,
    channel: u32,
    period_ns: u64,
    exported: bool,
    released: bool,
}

impl SysfsPwm {
    /// Export (if needed) and enable a PWM channel with the output at 0%
    pub fn open(class_path: &Path, chip: u32, channel: u32, frequency_hz: u32) -> Result<Self> {
        let chip_dir = class_path.join(format!("pwmchip{}", chip));
        if !chip_dir.is_dir() {
            return Err(PifanError::PwmSetup {
                chip: chip_dir,
                channel,
                reason: "PWM chip not found (is the pwm overlay enabled?)".into(),
            });
        }

        let channel_dir = chip_dir.join(format!("pwm{}", channel));
        let mut exported = false;
        if !channel_dir.is_dir() {
            let export = chip_dir.join("export");
            fs::write(&export, channel.to_string()).map_err(|e| PifanError::PwmSetup {
                chip: chip_dir.clone(),
                channel,
                reason: format!("Failed to export: {}", e),
            })?;
            exported = true;
            // udev needs a moment to apply permissions to the new attributes
            thread::sleep(Duration::from_millis(sysfs::EXPORT_SETTLE_MS));

            if !channel_dir.is_dir() {
                return Err(PifanError::PwmSetup {
                    chip: chip_dir,
                    channel,
                    reason: "channel did not appear after export".into(),
                });
            }
        }

        let output = Self {
            chip_dir,
            channel_dir,
            channel,
            period_ns: pwm::period_ns(frequency_hz),
            exported,
            released: false,
        };

        // duty_cycle must stay <= period, so zero it before changing the period
        output.write_attr("duty_cycle", 0)?;
        output.write_attr("period", output.period_ns)?;
        output.write_attr("enable", 1)?;

        info!(
            "PWM {} channel {} enabled at {} Hz (period {} ns)",
            output.chip_dir.display(),
            channel,
            frequency_hz,
            output.period_ns
        );
        Ok(output)
    }

    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    pub fn channel_dir(&self) -> &Path {
        &self.channel_dir
    }

    fn write_attr(&self, name: &str, value: u64) -> Result<()> {
        let path = self.channel_dir.join(name);
        fs::write(&path, value.to_string()).map_err(|e| PifanError::PwmWrite {
            path,
            reason: format!("Failed to write {}: {}", value, e),
        })
    }

    /// Stop the fan, disable the output and unexport if we exported it
    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        self.write_attr("duty_cycle", 0)?;
        self.write_attr("enable", 0)?;
        if self.exported {
            let unexport = self.chip_dir.join("unexport");
            fs::write(&unexport, self.channel.to_string())
                .map_err(|e| PifanError::FileWrite { path: unexport, source: e })?;
        }
        debug!("PWM channel {} released", self.channel);
        Ok(())
    }
}

impl DutySink for SysfsPwm {
    fn set_duty(&mut self, percent: u8) -> Result<()> {
        let percent = percent.min(duty::MAX_PERCENT);
        let duty_ns = duty::to_duty_ns(self.period_ns, percent);
        self.write_attr("duty_cycle", duty_ns)?;
        debug!(
            "PWM duty {}% ({} ns of {} ns, 8-bit {})",
            percent,
            duty_ns,
            self.period_ns,
            duty::to_byte(percent)
        );
        Ok(())
    }
}

impl Drop for SysfsPwm {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to release PWM channel {}: {}", self.channel, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_chip(exported: bool) -> TempDir {
        let dir = TempDir::new().unwrap();
        let chip = dir.path().join("pwmchip0");
        fs::create_dir_all(&chip).unwrap();
        fs::write(chip.join("export"), "").unwrap();
        fs::write(chip.join("unexport"), "").unwrap();
        if exported {
            let channel = chip.join("pwm0");
            fs::create_dir_all(&channel).unwrap();
            for attr in ["period", "duty_cycle", "enable"] {
                fs::write(channel.join(attr), "0").unwrap();
            }
        }
        dir
    }

    fn attr(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join("pwmchip0").join("pwm0").join(name)).unwrap()
    }

    #[test]
    fn test_open_configures_channel() {
        let dir = fake_chip(true);
        let output = SysfsPwm::open(dir.path(), 0, 0, 25_000).unwrap();
        assert_eq!(output.period_ns(), 40_000);
        assert_eq!(attr(&dir, "period"), "40000");
        assert_eq!(attr(&dir, "duty_cycle"), "0");
        assert_eq!(attr(&dir, "enable"), "1");
    }

    #[test]
    fn test_set_duty_scales_period() {
        let dir = fake_chip(true);
        let mut output = SysfsPwm::open(dir.path(), 0, 0, 25_000).unwrap();
        output.set_duty(35).unwrap();
        assert_eq!(attr(&dir, "duty_cycle"), "14000");
        output.set_duty(250).unwrap();
        assert_eq!(attr(&dir, "duty_cycle"), "40000");
    }

    #[test]
    fn test_drop_turns_fan_off() {
        let dir = fake_chip(true);
        {
            let mut output = SysfsPwm::open(dir.path(), 0, 0, 25_000).unwrap();
            output.set_duty(100).unwrap();
        }
        assert_eq!(attr(&dir, "duty_cycle"), "0");
        assert_eq!(attr(&dir, "enable"), "0");
    }

    #[test]
    fn test_missing_chip() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            SysfsPwm::open(dir.path(), 3, 0, 25_000),
            Err(PifanError::PwmSetup { .. })
        ));
    }

    #[test]
    fn test_export_that_never_appears() {
        let dir = fake_chip(false);
        assert!(matches!(
            SysfsPwm::open(dir.path(), 0, 0, 25_000),
            Err(PifanError::PwmSetup { .. })
        ));
        assert_eq!(
            fs::read_to_string(dir.path().join("pwmchip0").join("export")).unwrap(),
            "0"
        );
    }
}
