//! Thermal zone temperature source
//!
//! Linux reports thermal zone temperatures in millidegrees Celsius
//! (e.g., 45000 = 45.0°C). This module handles the conversion.

use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::temperature;
use crate::error::{PifanError, Result};

use super::TemperatureSource;

/// Read a millidegree temperature file in degrees Celsius
pub fn read_temperature(temp_path: &Path) -> Result<f32> {
    let content = fs::read_to_string(temp_path).map_err(|e| PifanError::TemperatureRead {
        path: temp_path.to_path_buf(),
        reason: format!("Failed to read: {}", e),
    })?;

    let millidegrees = content.trim().parse::<i64>().map_err(|e| PifanError::TemperatureRead {
        path: temp_path.to_path_buf(),
        reason: format!("Failed to parse '{}': {}", content.trim(), e),
    })?;

    Ok(millidegrees as f32 / temperature::MILLIDEGREE_DIVISOR)
}

/// CPU thermal zone, e.g. `/sys/class/thermal/thermal_zone0/temp`
#[derive(Debug, Clone)]
pub struct ThermalZone {
    path: PathBuf,
}

impl ThermalZone {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemperatureSource for ThermalZone {
    fn read_temperature(&mut self) -> Result<f32> {
        read_temperature(&self.path)
    }
}
