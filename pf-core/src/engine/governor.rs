//! Per-tick control decision
//!
//! Runs the decision pipeline for one temperature reading:
//!
//! 1. **SpeedTable**: base target for the temperature
//! 2. **EmergencyOverride**: forces 100% at or above the critical temperature,
//!    skipping the table and hysteresis
//! 3. **HysteresisGate**: delays drops until the temperature is clearly lower
//! 4. **DwellLimiter**: defers any change made too soon after the previous one
//!    (emergencies skip it unless configured otherwise)
//!
//! The governor is pure; the caller owns the state and performs the ramp.

use std::time::Instant;

use crate::data::ControllerConfig;
use crate::error::Result;

use super::dwell::DwellLimiter;
use super::emergency::EmergencyOverride;
use super::hysteresis::HysteresisGate;
use super::table::SpeedTable;

/// Why a decision came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// The table target was accepted
    Table,
    /// Critical temperature forced full speed
    Emergency,
    /// A lower table target was refused by hysteresis
    HeldByHysteresis,
    /// A change was refused because the last one was too recent
    DeferredByDwell,
    /// The table target equals the current duty cycle
    Unchanged,
}

/// Outcome of one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Target straight from the table
    pub base_target: u8,
    /// Target after the emergency override and hysteresis
    pub candidate_target: u8,
    /// Target after dwell limiting; what the ramp should move to
    pub final_target: u8,
    pub reason: DecisionReason,
}

impl Decision {
    /// Whether this decision requires a ramp away from `current`
    pub fn changes(&self, current: u8) -> bool {
        self.final_target != current
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Governor {
    table: SpeedTable,
    hysteresis: HysteresisGate,
    dwell: DwellLimiter,
    emergency: EmergencyOverride,
}

impl Governor {
    pub fn new(
        table: SpeedTable,
        hysteresis: HysteresisGate,
        dwell: DwellLimiter,
        emergency: EmergencyOverride,
    ) -> Self {
        Self {
            table,
            hysteresis,
            dwell,
            emergency,
        }
    }

    /// Build the pipeline from a configuration
    pub fn from_config(config: &ControllerConfig) -> Result<Self> {
        Ok(Self::new(
            SpeedTable::new(config.speed_table.clone())?,
            HysteresisGate::new(config.hysteresis_celsius),
            DwellLimiter::new(config.min_dwell()),
            EmergencyOverride::new(config.emergency_celsius, config.emergency_bypasses_dwell),
        ))
    }

    pub fn table(&self) -> &SpeedTable {
        &self.table
    }

    pub fn emergency(&self) -> &EmergencyOverride {
        &self.emergency
    }

    /// Decide the target duty cycle for this tick
    pub fn decide(
        &self,
        temperature: f32,
        current: u8,
        now: Instant,
        last_change: Option<Instant>,
    ) -> Decision {
        let base_target = self.table.target_for(temperature);

        if let Some(forced) = self.emergency.apply(temperature) {
            let final_target = if self.emergency.bypasses_dwell() {
                forced
            } else {
                self.dwell.limit(forced, current, now, last_change)
            };
            let reason = if final_target == forced {
                DecisionReason::Emergency
            } else {
                DecisionReason::DeferredByDwell
            };
            return Decision {
                base_target,
                candidate_target: forced,
                final_target,
                reason,
            };
        }

        let candidate_target = self.hysteresis.gate(&self.table, base_target, current, temperature);
        if candidate_target == current {
            let reason = if base_target == current {
                DecisionReason::Unchanged
            } else {
                DecisionReason::HeldByHysteresis
            };
            return Decision {
                base_target,
                candidate_target,
                final_target: current,
                reason,
            };
        }

        let final_target = self.dwell.limit(candidate_target, current, now, last_change);
        let reason = if final_target == candidate_target {
            DecisionReason::Table
        } else {
            DecisionReason::DeferredByDwell
        };

        Decision {
            base_target,
            candidate_target,
            final_target,
            reason,
        }
    }
}
