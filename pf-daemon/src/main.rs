//! pifan Daemon (pifand)
//!
//! Closed-loop fan control for a single-board computer: reads the SoC
//! thermal zone, drives a PWM fan through sysfs and counts tachometer
//! pulses on a GPIO line.
//!
//! # Lifecycle
//! - **Startup**: parse arguments, initialise logging, load configuration,
//!   open the peripherals
//! - **Run**: the `FanController` loop until SIGINT/SIGTERM
//! - **Shutdown**: fan commanded to 0%, PWM output disabled, tach thread joined
//!
//! # Logging
//! Filter from `PIFAN_LOG` (default `info`). Goes to the systemd journal
//! when available, stdout otherwise.

mod cli;
mod fan_control;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use pf_core::constants::paths;
use pf_core::{load_config_from, ControllerConfig, PulseCounter, SysfsPwm, TachInput, ThermalZone};

use crate::cli::Cli;
use crate::fan_control::{FanController, Shutdown};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const JOURNALD_SOCKET: &str = "/run/systemd/journal/socket";

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        // stderr ends up in the journal when running as a service
        eprintln!("PANIC at {}: {}", location, message);
    }));
}

/// Returns true when logging to the systemd journal
fn init_logging(log_level: &str) -> bool {
    if Path::new(JOURNALD_SOCKET).exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(log_level))
                    .init();
                return true;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stdout", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(log_level)
        .init();
    false
}

fn warn_if_unprivileged() {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        warn!(
            "Running as euid={}; sysfs PWM and GPIO exports usually require root",
            euid
        );
    } else {
        debug!("Running as root");
    }
}

fn log_config_summary(config: &ControllerConfig) {
    let table = config
        .speed_table
        .iter()
        .map(|e| format!("{}°C:{}%", e.threshold, e.percent))
        .collect::<Vec<_>>()
        .join(", ");
    info!("STARTUP: Speed table: {}", table);
    info!(
        "STARTUP: Hysteresis {:.1}°C, dwell {}s, emergency {:.1}°C (bypasses dwell: {})",
        config.hysteresis_celsius,
        config.min_dwell_secs,
        config.emergency_celsius,
        config.emergency_bypasses_dwell
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    install_panic_hook();

    let cli = Cli::parse();

    if cli.print_default_config {
        println!("{}", serde_json::to_string_pretty(&ControllerConfig::default())?);
        return Ok(());
    }

    let log_level = std::env::var("PIFAN_LOG").unwrap_or_else(|_| "info".to_string());
    let use_journald = init_logging(&log_level);

    info!("STARTUP: pifand {} starting", VERSION);
    info!("STARTUP: Logging to {}", if use_journald { "systemd journal" } else { "stdout" });
    warn_if_unprivileged();

    let config_path = cli.config.clone().unwrap_or_else(paths::default_config_path);
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    info!("STARTUP: Configuration: {}", config_path.display());
    if cli.no_tach {
        config.hardware.tach_enabled = false;
    }
    log_config_summary(&config);

    let shutdown = Arc::new(Shutdown::new());
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("SIGNAL: Received SIGINT/SIGTERM - initiating shutdown");
            shutdown.trigger();
        }) {
            warn!("Failed to set signal handler: {}. Shutdown via signals may not work cleanly.", e);
        }
    }

    let hw = &config.hardware;
    let sensor = ThermalZone::new(&hw.thermal_zone_path);
    let pwm = SysfsPwm::open(&hw.pwm_class_path, hw.pwm_chip, hw.pwm_channel, hw.pwm_frequency_hz)
        .context("Failed to open PWM output")?;
    info!(
        "STARTUP: PWM pwmchip{}/pwm{} at {} Hz",
        hw.pwm_chip, hw.pwm_channel, hw.pwm_frequency_hz
    );

    let mut tach_input = None;
    let mut counter = None;
    if hw.tach_enabled {
        let pulses = Arc::new(PulseCounter::new());
        match TachInput::start(&hw.gpio_class_path, hw.tach_gpio, pulses.clone()) {
            Ok(input) => {
                info!("STARTUP: Tachometer on GPIO {}", input.pin());
                tach_input = Some(input);
                counter = Some(pulses);
            }
            Err(e) => warn!("Tachometer unavailable, RPM reporting disabled: {}", e),
        }
    } else {
        info!("STARTUP: Tachometer disabled");
    }

    let mut controller = FanController::new(&config, sensor, pwm, counter, shutdown)?;
    let result = controller.run().await;

    drop(controller);
    drop(tach_input);

    result?;
    info!("SHUTDOWN: pifand stopped");
    Ok(())
}
