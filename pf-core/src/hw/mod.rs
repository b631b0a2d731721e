//! Hardware interaction modules
//!
//! Linux peripheral bindings for the control loop: the CPU thermal zone, a
//! sysfs PWM channel driving the fan, and a sysfs GPIO tachometer input.
//! The control loop only sees the [`TemperatureSource`] and [`DutySink`]
//! traits, so tests and other boards can substitute their own bindings.

mod gpio;
mod pwm;
mod thermal;

pub use gpio::TachInput;
pub use pwm::SysfsPwm;
pub use thermal::{read_temperature, ThermalZone};

use crate::error::Result;

/// Something that reports a temperature in °C
pub trait TemperatureSource {
    fn read_temperature(&mut self) -> Result<f32>;
}

/// Something that applies a duty cycle to the fan
///
/// A failed write means the fan is not being actuated; callers treat it as
/// fatal.
pub trait DutySink {
    fn set_duty(&mut self, percent: u8) -> Result<()>;
}

impl<T: TemperatureSource + ?Sized> TemperatureSource for Box<T> {
    fn read_temperature(&mut self) -> Result<f32> {
        (**self).read_temperature()
    }
}

impl<T: DutySink + ?Sized> DutySink for Box<T> {
    fn set_duty(&mut self, percent: u8) -> Result<()> {
        (**self).set_duty(percent)
    }
}
