/*
 * Integration tests for pf-core
 *
 * These drive the decision pipeline, ramp planner and tachometer
 * together the way the daemon does for one control tick.
 */

use std::fs;
use std::time::{Duration, Instant};

use pf_core::{
    estimate_rpm, load_config_from, save_config, ControllerConfig, ControllerState,
    DecisionReason, Governor, PulseCounter, Ramper, SpeedTable, SpeedTableEntry, StallDetector,
    StallStatus,
};
use tempfile::TempDir;

// Test utilities
fn reference_config() -> ControllerConfig {
    ControllerConfig {
        speed_table: vec![
            SpeedTableEntry { threshold: 0.0, percent: 0 },
            SpeedTableEntry { threshold: 45.0, percent: 0 },
            SpeedTableEntry { threshold: 50.0, percent: 20 },
            SpeedTableEntry { threshold: 55.0, percent: 35 },
            SpeedTableEntry { threshold: 60.0, percent: 55 },
            SpeedTableEntry { threshold: 65.0, percent: 70 },
            SpeedTableEntry { threshold: 70.0, percent: 85 },
            SpeedTableEntry { threshold: 999.0, percent: 100 },
        ],
        hysteresis_celsius: 2.0,
        min_dwell_secs: 10,
        ramp_step_percent: 5,
        emergency_celsius: 80.0,
        ..ControllerConfig::default()
    }
}

/// One tick without real delays: decide, then apply the whole ramp
fn tick(
    governor: &Governor,
    ramper: &Ramper,
    state: &mut ControllerState,
    temperature: f32,
    now: Instant,
) -> Vec<u8> {
    let decision = governor.decide(temperature, state.applied_percent, now, state.last_change_time);
    if !decision.changes(state.applied_percent) {
        return Vec::new();
    }

    let writes: Vec<u8> = ramper.plan(state.applied_percent, decision.final_target).collect();
    state.applied_percent = decision.final_target;
    state.last_change_time = Some(now);
    writes
}

#[test]
fn test_hysteresis_holds_then_releases() {
    let governor = Governor::from_config(&reference_config()).unwrap();
    let ramper = Ramper::new(5, Duration::ZERO);
    let start = Instant::now();
    let mut state = ControllerState {
        applied_percent: 55,
        last_change_time: None,
    };

    // 54°C is inside the 2°C band below the 55°C tier
    assert!(tick(&governor, &ramper, &mut state, 54.0, start).is_empty());
    assert_eq!(state.applied_percent, 55);

    // 52°C is clear of the band
    let writes = tick(&governor, &ramper, &mut state, 52.0, start);
    assert_eq!(writes, vec![50, 45, 40, 35]);
    assert_eq!(state.applied_percent, 35);
}

#[test]
fn test_dwell_suppresses_second_change() {
    let governor = Governor::from_config(&reference_config()).unwrap();
    let ramper = Ramper::new(5, Duration::ZERO);
    let start = Instant::now();
    let mut state = ControllerState::new();

    assert_eq!(tick(&governor, &ramper, &mut state, 47.0, start).last(), Some(&20));

    let soon = start + Duration::from_secs(4);
    let decision = governor.decide(62.0, state.applied_percent, soon, state.last_change_time);
    assert_eq!(decision.reason, DecisionReason::DeferredByDwell);
    assert!(tick(&governor, &ramper, &mut state, 62.0, soon).is_empty());
    assert_eq!(state.applied_percent, 20);

    let later = start + Duration::from_secs(10);
    assert_eq!(tick(&governor, &ramper, &mut state, 62.0, later).last(), Some(&70));
}

#[test]
fn test_emergency_jump_from_cool() {
    let governor = Governor::from_config(&reference_config()).unwrap();
    let ramper = Ramper::new(5, Duration::ZERO);
    let start = Instant::now();
    let mut state = ControllerState::new();

    assert!(tick(&governor, &ramper, &mut state, 40.0, start).is_empty());

    // A recent change would normally defer the next one
    state.last_change_time = Some(start);
    let writes = tick(&governor, &ramper, &mut state, 95.0, start + Duration::from_secs(1));
    assert_eq!(writes.len(), 20);
    assert_eq!(writes.last(), Some(&100));
    assert_eq!(state.applied_percent, 100);
}

#[test]
fn test_table_saturates_above_highest_threshold() {
    let table = SpeedTable::new(reference_config().speed_table).unwrap();
    assert_eq!(table.target_for(999.0), 100);
    assert_eq!(table.target_for(1500.0), 100);
    assert_eq!(table.target_for(f32::INFINITY), 100);
}

#[test]
fn test_ramp_write_count_bound() {
    let ramper = Ramper::new(5, Duration::from_millis(100));
    assert_eq!(ramper.plan(0, 100).len(), 20);
    assert_eq!(ramper.plan(35, 55).len(), 4);
    assert_eq!(ramper.plan(55, 33).len(), 5);
    assert_eq!(ramper.plan(55, 33).last(), Some(33));
}

#[test]
fn test_tach_round_trip() {
    let counter = PulseCounter::new();
    // 1200 RPM at 2 pulses per revolution over a 2 second window
    for _ in 0..80 {
        counter.record();
    }
    assert_eq!(estimate_rpm(counter.take(), 2, 2), 1200);
    assert_eq!(counter.read(), 0);
}

#[test]
fn test_stall_detected_and_recovered() {
    let config = reference_config();
    let mut detector = StallDetector::new(&config.stall);

    assert_eq!(detector.observe(55, 0), StallStatus::Suspect);
    assert_eq!(detector.observe(55, 0), StallStatus::Suspect);
    assert_eq!(detector.observe(55, 0), StallStatus::Stalled);
    assert!(detector.is_stalled());
    assert_eq!(detector.observe(55, 900), StallStatus::Recovered);
}

#[test]
fn test_config_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pifan").join("config.json");

    let mut config = reference_config();
    config.hardware.tach_gpio = 27;
    save_config(&config, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded.hardware.tach_gpio, 27);
    assert_eq!(loaded.speed_table.len(), 8);

    // Partial files pick up defaults for everything else
    fs::write(&path, r#"{ "min_dwell_secs": 3 }"#).unwrap();
    let partial = load_config_from(&path).unwrap();
    assert_eq!(partial.min_dwell_secs, 3);
    assert_eq!(partial.speed_table, ControllerConfig::default().speed_table);
}
