//! Direction-aware hysteresis
//!
//! Rising targets are admitted immediately. A falling target is admitted only
//! once the temperature is at least `margin` below the threshold of the tier
//! being dropped to, so a temperature hovering on a tier boundary does not
//! toggle the fan.

use super::table::SpeedTable;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisGate {
    margin: f32,
}

impl HysteresisGate {
    /// Create a gate with a margin in °C (negative margins are clamped to 0)
    pub fn new(margin: f32) -> Self {
        Self {
            margin: margin.max(0.0),
        }
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Candidate target after hysteresis
    ///
    /// The drop threshold is looked up with first-match semantics; a lower
    /// target with no table entry (never produced by the table itself) is
    /// admitted.
    pub fn gate(&self, table: &SpeedTable, base_target: u8, current: u8, temperature: f32) -> u8 {
        if base_target >= current {
            return base_target;
        }

        match table.threshold_for(base_target) {
            Some(threshold) if temperature <= threshold - self.margin => base_target,
            Some(_) => current,
            None => base_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::table::tests::reference_table;

    #[test]
    fn test_rising_is_never_delayed() {
        let table = reference_table();
        let gate = HysteresisGate::new(2.0);
        assert_eq!(gate.gate(&table, 55, 35, 56.0), 55);
        assert_eq!(gate.gate(&table, 100, 0, 90.0), 100);
    }

    #[test]
    fn test_equal_target_is_unchanged() {
        let table = reference_table();
        let gate = HysteresisGate::new(2.0);
        assert_eq!(gate.gate(&table, 35, 35, 54.0), 35);
    }

    #[test]
    fn test_drop_held_inside_margin() {
        let table = reference_table();
        let gate = HysteresisGate::new(2.0);
        // threshold for 35% is 55°C, so drops need <= 53°C
        assert_eq!(gate.gate(&table, 35, 55, 54.0), 55);
        assert_eq!(gate.gate(&table, 35, 55, 53.01), 55);
    }

    #[test]
    fn test_drop_admitted_at_and_below_margin() {
        let table = reference_table();
        let gate = HysteresisGate::new(2.0);
        assert_eq!(gate.gate(&table, 35, 55, 53.0), 35);
        assert_eq!(gate.gate(&table, 35, 55, 52.0), 35);
    }

    #[test]
    fn test_repeated_percent_uses_first_threshold() {
        let table = reference_table();
        let gate = HysteresisGate::new(2.0);
        // 0% first appears at 0°C, so dropping to 0% needs <= -2°C
        assert_eq!(gate.gate(&table, 0, 20, 30.0), 20);
        assert_eq!(gate.gate(&table, 0, 20, -2.0), 0);
    }

    #[test]
    fn test_zero_margin_admits_drop_at_threshold() {
        let table = reference_table();
        let gate = HysteresisGate::new(0.0);
        assert_eq!(gate.gate(&table, 35, 55, 55.0), 35);
    }

    #[test]
    fn test_negative_margin_clamped() {
        assert_eq!(HysteresisGate::new(-3.0).margin(), 0.0);
    }
}
