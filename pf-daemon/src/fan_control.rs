//! Fan Control Loop
//!
//! Drives one fan from one temperature sensor. Each tick:
//!
//! 1. Read the temperature (failures degrade to a sentinel reading)
//! 2. Ask the `Governor` for the target duty cycle
//! 3. Ramp toward it in bounded steps
//! 4. Sample the tachometer for one window and report
//!
//! # Safety Features
//! - **Cooperative cancellation**: every ramp delay and sampling window races
//!   the shutdown notification, so shutdown lands within one step
//! - **Fan off on exit**: the loop commands 0% before returning, on success or error
//! - **Error counting**: sensor failures are logged on the first and every Nth
//! - **Stall detection**: zero RPM while driven is reported, never acted on

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use pf_core::constants::{control, temperature};
use pf_core::{
    ControllerConfig, ControllerState, Decision, DecisionReason, DutySink, Governor, PulseCounter,
    Ramper, Report, RpmEstimator, StallDetector, StallStatus, TemperatureSource,
};
use pf_error::Result;

/// Process-wide stop request shared with the signal handler
pub struct Shutdown {
    requested: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Request shutdown; safe to call from any thread
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been requested
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a trigger in between is not missed
            let notified = self.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-fan controller; owns the sensor, the actuator and the loop state
pub struct FanController<T, D> {
    sensor: T,
    fan: D,
    governor: Governor,
    ramper: Ramper,
    estimator: RpmEstimator,
    tach: Option<Arc<PulseCounter>>,
    stall: StallDetector,
    state: ControllerState,
    sample_window: Duration,
    shutdown: Arc<Shutdown>,
    sensor_failures: u32,
}

impl<T: TemperatureSource, D: DutySink> FanController<T, D> {
    /// Build a controller; `tach` is None when no tachometer is wired
    pub fn new(
        config: &ControllerConfig,
        sensor: T,
        fan: D,
        tach: Option<Arc<PulseCounter>>,
        shutdown: Arc<Shutdown>,
    ) -> Result<Self> {
        Ok(Self {
            sensor,
            fan,
            governor: Governor::from_config(config)?,
            ramper: Ramper::new(config.ramp_step_percent, config.ramp_step_delay()),
            estimator: RpmEstimator::new(config.pulses_per_revolution),
            tach,
            stall: StallDetector::new(&config.stall),
            state: ControllerState::new(),
            sample_window: config.sample_window(),
            shutdown,
            sensor_failures: 0,
        })
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_stalled(&self) -> bool {
        self.stall.is_stalled()
    }

    /// Consecutive failed temperature reads
    pub fn sensor_failures(&self) -> u32 {
        self.sensor_failures
    }

    /// Run until shutdown or a fatal actuator error, then stop the fan
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Fan control loop started (window {}s, ramp {}%/{}ms, emergency {:.1}°C)",
            self.sample_window.as_secs(),
            self.ramper.step(),
            self.ramper.step_delay().as_millis(),
            self.governor.emergency().threshold()
        );

        let result = self.control_loop().await;
        if let Err(e) = &result {
            error!("Fan control loop stopped: {}", e);
        }

        if self.is_stalled() {
            warn!("Exiting while the fan is reported stalled");
        }
        if self.sensor_failures() > 0 {
            warn!("Exiting after {} consecutive temperature read failures", self.sensor_failures());
        }

        let last_percent = self.state().applied_percent;
        let stopped = self.fan.set_duty(0);
        match &stopped {
            Ok(()) => {
                self.state.applied_percent = 0;
                info!("Fan stopped (was {}%)", last_percent);
            }
            Err(e) => error!("Failed to stop fan at {}%: {}", last_percent, e),
        }

        result.and(stopped)
    }

    async fn control_loop(&mut self) -> Result<()> {
        while !self.shutdown.is_triggered() {
            self.tick().await?;
        }
        Ok(())
    }

    /// One control tick; `Ok(None)` when shutdown interrupted it
    pub async fn tick(&mut self) -> Result<Option<Report>> {
        let temperature = self.read_temperature();
        let current = self.state.applied_percent;

        let decision = self.governor.decide(
            temperature,
            current,
            Instant::now().into_std(),
            self.state.last_change_time,
        );
        self.log_decision(temperature, current, &decision);

        if decision.changes(current) && !self.ramp_to(decision.final_target).await? {
            debug!("Ramp interrupted at {}%", self.state.applied_percent);
            return Ok(None);
        }

        let rpm = match self.sample_rpm().await {
            Some(rpm) => rpm,
            None => return Ok(None),
        };
        if let Some(rpm) = rpm {
            self.check_stall(rpm);
        }

        let report = Report {
            temperature,
            applied_percent: self.state.applied_percent,
            rpm,
        };
        info!("{}", report);
        Ok(Some(report))
    }

    fn read_temperature(&mut self) -> f32 {
        let failure = match self.sensor.read_temperature() {
            Ok(t) if t.is_finite() => {
                if self.sensor_failures > 0 {
                    info!("Temperature sensor recovered after {} failures", self.sensor_failures);
                    self.sensor_failures = 0;
                }
                return t;
            }
            Ok(t) => format!("non-finite reading {}", t),
            Err(e) => e.to_string(),
        };

        self.sensor_failures = self.sensor_failures.saturating_add(1);
        if self.sensor_failures == 1 || self.sensor_failures % control::SENSOR_FAILURE_LOG_EVERY == 0 {
            warn!(
                "Temperature read failed (count: {}): {}; using {:.1}°C",
                self.sensor_failures,
                failure,
                temperature::SENSOR_FAILURE_CELSIUS
            );
        }
        temperature::SENSOR_FAILURE_CELSIUS
    }

    fn log_decision(&self, temperature: f32, current: u8, decision: &Decision) {
        match decision.reason {
            DecisionReason::Unchanged => {}
            DecisionReason::Table => info!(
                "Fan {}% -> {}% at {:.1}°C",
                current, decision.final_target, temperature
            ),
            DecisionReason::Emergency if decision.changes(current) => warn!(
                "EMERGENCY: {:.1}°C >= {:.1}°C, forcing fan to {}%",
                temperature,
                self.governor.emergency().threshold(),
                decision.final_target
            ),
            DecisionReason::Emergency => debug!("Emergency at {:.1}°C, already at 100%", temperature),
            DecisionReason::HeldByHysteresis => debug!(
                "Holding {}% at {:.1}°C (table {}%, inside hysteresis band)",
                current, temperature, decision.base_target
            ),
            DecisionReason::DeferredByDwell => debug!(
                "Deferring {}% -> {}%: last change too recent",
                current, decision.candidate_target
            ),
        }
    }

    /// Step to `target`; false if shutdown cut the ramp short
    async fn ramp_to(&mut self, target: u8) -> Result<bool> {
        let mut steps = self.ramper.plan(self.state.applied_percent, target).peekable();

        while let Some(value) = steps.next() {
            self.fan.set_duty(value)?;
            self.state.applied_percent = value;

            if steps.peek().is_some() && !self.pause(self.ramper.step_delay()).await {
                return Ok(false);
            }
        }

        self.state.last_change_time = Some(Instant::now().into_std());
        Ok(true)
    }

    /// Wait one sampling window; `None` if shutdown cut it short,
    /// `Some(None)` when no tachometer is wired
    async fn sample_rpm(&mut self) -> Option<Option<u32>> {
        let started = Instant::now();
        if let Some(counter) = &self.tach {
            counter.reset();
        }

        if !self.pause(self.sample_window).await {
            return None;
        }

        let elapsed_secs = started.elapsed().as_secs();
        Some(
            self.tach
                .as_ref()
                .map(|counter| self.estimator.estimate(counter.take(), elapsed_secs)),
        )
    }

    fn check_stall(&mut self, rpm: u32) {
        let applied = self.state.applied_percent;
        match self.stall.observe(applied, rpm) {
            StallStatus::Stalled => error!("FAN STALL: driven at {}% but reading 0 RPM", applied),
            StallStatus::Recovered => info!("Fan spinning again ({} RPM)", rpm),
            StallStatus::Suspect => debug!("No tach pulses at {}%", applied),
            StallStatus::Ok | StallStatus::StillStalled => {}
        }
    }

    /// Sleep unless shutdown arrives first; true when the full duration elapsed
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => false,
            _ = time::sleep(duration) => true,
        }
    }
}
