//! Tachometer input via sysfs GPIO edge interrupts
//!
//! The fan's open-collector tach line pulls the pin low twice per revolution.
//! With `edge` set to `falling`, the kernel flags `value` with POLLPRI on each
//! falling edge; a dedicated thread waits in `poll(2)` and bumps the shared
//! [`PulseCounter`]. The poll timeout bounds how long a stop request waits.
//!
//! sysfs GPIO cannot configure bias, so the pull-up must come from the board
//! or the device tree (e.g. `gpio=17=ip,pu` in config.txt).

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::constants::{sysfs, tach};
use crate::engine::PulseCounter;
use crate::error::{PifanError, Result};

pub struct TachInput {
    pin: u32,
    class_path: PathBuf,
    exported: bool,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl TachInput {
    /// Configure `pin` as a falling-edge input and start counting into `counter`
    pub fn start(class_path: &Path, pin: u32, counter: Arc<PulseCounter>) -> Result<Self> {
        let gpio_dir = class_path.join(format!("gpio{}", pin));
        let mut exported = false;
        if !gpio_dir.is_dir() {
            fs::write(class_path.join("export"), pin.to_string())
                .map_err(|e| PifanError::gpio(pin, format!("Failed to export: {}", e)))?;
            exported = true;
            thread::sleep(Duration::from_millis(sysfs::EXPORT_SETTLE_MS));
            if !gpio_dir.is_dir() {
                return Err(PifanError::gpio(pin, "pin did not appear after export"));
            }
        }

        write_gpio_attr(&gpio_dir, pin, "direction", "in")?;
        write_gpio_attr(&gpio_dir, pin, "edge", "falling")?;

        let value = File::open(gpio_dir.join("value"))
            .map_err(|e| PifanError::gpio(pin, format!("Failed to open value: {}", e)))?;

        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(format!("pifan-tach{}", pin))
                .spawn(move || edge_loop(value, pin, &counter, &stop))
                .map_err(|e| PifanError::gpio(pin, format!("Failed to spawn edge thread: {}", e)))?
        };

        info!("Tachometer on GPIO{} counting falling edges", pin);
        Ok(Self {
            pin,
            class_path: class_path.to_path_buf(),
            exported,
            stop,
            worker: Some(worker),
        })
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }
}

impl Drop for TachInput {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Tachometer thread for GPIO{} panicked", self.pin);
            }
        }
        if self.exported {
            if let Err(e) = fs::write(self.class_path.join("unexport"), self.pin.to_string()) {
                warn!("Failed to unexport GPIO{}: {}", self.pin, e);
            }
        }
        debug!("Tachometer on GPIO{} stopped", self.pin);
    }
}

fn write_gpio_attr(gpio_dir: &Path, pin: u32, name: &str, value: &str) -> Result<()> {
    fs::write(gpio_dir.join(name), value)
        .map_err(|e| PifanError::gpio(pin, format!("Failed to set {}={}: {}", name, value, e)))
}

/// Re-arm the edge flag by reading `value` from the start
fn rearm(value: &mut File) -> io::Result<()> {
    let mut buf = [0u8; 8];
    value.seek(SeekFrom::Start(0))?;
    let _ = value.read(&mut buf)?;
    Ok(())
}

fn edge_loop(mut value: File, pin: u32, counter: &PulseCounter, stop: &AtomicBool) {
    // A stale edge may already be flagged from before we configured the pin
    if let Err(e) = rearm(&mut value) {
        warn!("GPIO{}: initial read failed: {}", pin, e);
    }

    let timeout_ms = tach::POLL_TIMEOUT.as_millis() as libc::c_int;
    while !stop.load(Ordering::SeqCst) {
        let mut pfd = libc::pollfd {
            fd: value.as_raw_fd(),
            events: libc::POLLPRI | libc::POLLERR,
            revents: 0,
        };
        // SAFETY: pfd is a single valid pollfd that outlives the call, and its fd
        // stays open because `value` is owned by this function.
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            warn!("GPIO{}: poll failed, tachometer stopped: {}", pin, err);
            return;
        }
        if rc == 0 {
            continue;
        }

        if pfd.revents & libc::POLLPRI != 0 {
            counter.record();
        }
        if let Err(e) = rearm(&mut value) {
            warn!("GPIO{}: read failed, tachometer stopped: {}", pin, e);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    fn fake_gpio(pin: u32) -> TempDir {
        let dir = TempDir::new().unwrap();
        let gpio = dir.path().join(format!("gpio{}", pin));
        fs::create_dir_all(&gpio).unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        for (attr, value) in [("direction", "out"), ("edge", "none"), ("value", "1")] {
            fs::write(gpio.join(attr), value).unwrap();
        }
        dir
    }

    #[test]
    fn test_start_configures_pin_and_stops_on_drop() {
        let dir = fake_gpio(17);
        let counter = Arc::new(PulseCounter::new());

        let tach = TachInput::start(dir.path(), 17, Arc::clone(&counter)).unwrap();
        let gpio = dir.path().join("gpio17");
        assert_eq!(fs::read_to_string(gpio.join("direction")).unwrap(), "in");
        assert_eq!(fs::read_to_string(gpio.join("edge")).unwrap(), "falling");
        assert_eq!(tach.pin(), 17);

        let started = Instant::now();
        drop(tach);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_export_that_never_appears() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        let counter = Arc::new(PulseCounter::new());

        let err = TachInput::start(dir.path(), 27, counter).err().unwrap();
        assert!(matches!(err, PifanError::Gpio { pin: 27, .. }));
        assert_eq!(fs::read_to_string(dir.path().join("export")).unwrap(), "27");
    }
}
