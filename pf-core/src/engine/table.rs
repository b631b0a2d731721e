//! Speed table lookup
//!
//! Maps a temperature to a duty cycle by scanning tiers in ascending threshold
//! order. Unlike an interpolated curve the output is stepped: every
//! temperature up to and including a tier's threshold gets that tier's percent.

use crate::constants::duty;
use crate::data::{validate_speed_table, SpeedTableEntry};
use crate::error::Result;

/// Validated, read-only speed table
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedTable {
    entries: Vec<SpeedTableEntry>,
}

impl SpeedTable {
    /// Build a table, rejecting entries that break the ordering invariants
    pub fn new(entries: Vec<SpeedTableEntry>) -> Result<Self> {
        validate_speed_table(&entries)?;
        Ok(Self { entries })
    }

    /// Target duty cycle for a temperature
    ///
    /// Returns the percent of the first entry whose threshold is at or above
    /// `temperature`, or 100 when the temperature is above every threshold.
    /// Sensor-failure sentinels lie below every threshold and therefore
    /// resolve to the lowest tier; NaN is treated the same way.
    pub fn target_for(&self, temperature: f32) -> u8 {
        if temperature.is_nan() {
            return self.lowest_percent();
        }

        self.entries
            .iter()
            .find(|entry| entry.threshold >= temperature)
            .map(|entry| entry.percent)
            .unwrap_or(duty::MAX_PERCENT)
    }

    /// Threshold of the first entry mapping to `percent`
    ///
    /// First-match semantics: with repeated percents the lowest threshold wins.
    pub fn threshold_for(&self, percent: u8) -> Option<f32> {
        self.entries
            .iter()
            .find(|entry| entry.percent == percent)
            .map(|entry| entry.threshold)
    }

    /// Percent of the coolest tier
    pub fn lowest_percent(&self) -> u8 {
        self.entries.first().map(|e| e.percent).unwrap_or(duty::MIN_PERCENT)
    }

    /// Get the table entries
    pub fn entries(&self) -> &[SpeedTableEntry] {
        &self.entries
    }
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self {
            entries: crate::constants::default_table::standard(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `{0:0, 45:0, 50:20, 55:35, 60:55, 65:70, 70:85, 999:100}`
    pub(crate) fn reference_table() -> SpeedTable {
        SpeedTable::new(vec![
            SpeedTableEntry { threshold: 0.0, percent: 0 },
            SpeedTableEntry { threshold: 45.0, percent: 0 },
            SpeedTableEntry { threshold: 50.0, percent: 20 },
            SpeedTableEntry { threshold: 55.0, percent: 35 },
            SpeedTableEntry { threshold: 60.0, percent: 55 },
            SpeedTableEntry { threshold: 65.0, percent: 70 },
            SpeedTableEntry { threshold: 70.0, percent: 85 },
            SpeedTableEntry { threshold: 999.0, percent: 100 },
        ])
        .unwrap()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let table = reference_table();
        assert_eq!(table.target_for(50.0), 20);
        assert_eq!(table.target_for(50.1), 35);
        assert_eq!(table.target_for(54.0), 35);
        assert_eq!(table.target_for(55.0), 35);
        assert_eq!(table.target_for(69.9), 85);
    }

    #[test]
    fn test_above_all_thresholds_is_full_speed() {
        let table = reference_table();
        for temp in [70.5, 95.0, 999.0, 1000.0, f32::INFINITY] {
            assert_eq!(table.target_for(temp), 100, "temp {}", temp);
        }
    }

    #[test]
    fn test_cool_temperatures_are_lowest_tier() {
        let table = reference_table();
        for temp in [-40.0, 0.0, 20.0, 44.9, 45.0] {
            assert_eq!(table.target_for(temp), 0, "temp {}", temp);
        }
    }

    #[test]
    fn test_failure_sentinel_resolves_to_lowest_tier() {
        let table = SpeedTable::default();
        assert_eq!(table.target_for(crate::constants::temperature::SENSOR_FAILURE_CELSIUS), 0);
        assert_eq!(table.target_for(f32::NAN), 0);
    }

    #[test]
    fn test_lookup_is_monotonic() {
        let table = reference_table();
        let mut last = 0;
        let mut temp = -10.0;
        while temp < 120.0 {
            let percent = table.target_for(temp);
            assert!(percent >= last, "{}% at {}°C after {}%", percent, temp, last);
            last = percent;
            temp += 0.25;
        }
    }

    #[test]
    fn test_threshold_for_uses_first_match() {
        let table = reference_table();
        assert_eq!(table.threshold_for(35), Some(55.0));
        assert_eq!(table.threshold_for(0), Some(0.0));
        assert_eq!(table.threshold_for(42), None);
    }

    #[test]
    fn test_rejects_invalid_entries() {
        assert!(SpeedTable::new(vec![]).is_err());
        assert!(SpeedTable::new(vec![SpeedTableEntry { threshold: 60.0, percent: 80 }]).is_err());
    }
}
