//! Device reading, gesture dispatch and device discovery (I/O layer).
//!
//! Pure event-processing logic lives in [`crate::event`].
use std::path::Path;
use std::process::{Command, ExitCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use evdev::{AbsoluteAxisType, Device};
use log::{debug, error, info, warn};

use crate::config::{AppConfig, PadgestrError, parse_config_file};
use crate::detector::{Gesture, GestureDetector};
use crate::event::{classify_event, parse_command, resolve_action};
use crate::window::{WindowClassSource, X11Windows};

/// Gestures waiting for dispatch before new ones are dropped.
const GESTURE_QUEUE_CAPACITY: usize = 32;

/// How often the dispatch loop checks the running flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

// -- GestureManager (top-level orchestrator) ------------------

/// Reads the touchpad and runs the command configured for each gesture.
pub struct GestureManager {
    config: Arc<AppConfig>,
    running: Arc<AtomicBool>,
}

impl GestureManager {
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self, PadgestrError> {
        Ok(Self {
            config: Arc::new(parse_config_file(config_path.as_ref())?),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Open the device and process gestures until shutdown or until the
    /// device goes away.  In test mode gestures are printed, not dispatched.
    pub fn start(&self, test_mode: bool) -> Result<(), PadgestrError> {
        let path = &self.config.device_path;
        let device = Device::open(path).map_err(|e| PadgestrError::DeviceOpenError {
            path: path.clone(),
            source: e,
        })?;

        if !is_touch_device(&device) {
            warn!(
                "{} ({}) reports no multi-touch axes; gestures will not be detected",
                path.display(),
                device.name().unwrap_or("unknown")
            );
        }

        let configured = self.config.configured_fingers();
        if configured.is_empty() {
            warn!("No gesture actions configured");
        }

        // Connect before reading so a missing display fails at startup.
        let windows: Option<Arc<dyn WindowClassSource>> = if test_mode {
            None
        } else {
            let windows: Arc<dyn WindowClassSource> = Arc::new(X11Windows::connect()?);
            Some(windows)
        };

        self.running.store(true, Ordering::Relaxed);
        info!(
            "Listening on {} ({})",
            path.display(),
            device.name().unwrap_or("unknown")
        );

        let mut detector = GestureDetector::new(configured, self.config.thresholds);
        let (sender, receiver) = mpsc::sync_channel(GESTURE_QUEUE_CAPACITY);
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("padgestr-reader".to_string())
            .spawn(move || read_loop(device, &mut detector, &sender, &running))
            .map_err(PadgestrError::ReaderSpawnError)?;

        match windows {
            None => {
                println!("Try some gestures on the touchpad");
                self.receive_loop(&receiver, |gesture| println!("Detected: {gesture}"));
            }
            Some(windows) => {
                let config = Arc::clone(&self.config);
                self.receive_loop(&receiver, |gesture| {
                    spawn_dispatch(gesture, Arc::clone(&config), Arc::clone(&windows));
                });
            }
        }
        Ok(())
    }

    /// Pull gestures off the queue until shutdown or the reader stops.
    fn receive_loop(&self, receiver: &Receiver<Gesture>, mut on_gesture: impl FnMut(Gesture)) {
        while self.running.load(Ordering::Relaxed) {
            match receiver.recv_timeout(SHUTDOWN_POLL) {
                Ok(gesture) => on_gesture(gesture),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    error!("Input device reader stopped");
                    break;
                }
            }
        }
    }

    /// Get a reference to the running flag for signal handling.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Get the log level from the parsed configuration.
    pub fn config_log_level(&self) -> &str {
        &self.config.log_level
    }

    /// Get the optional log file path from the parsed configuration.
    pub fn config_log_file(&self) -> Option<&str> {
        self.config.log_file.as_deref()
    }
}

// -- Device I/O -----------------------------------------------

/// Check if a device has multi-touch capabilities.
fn is_touch_device(device: &Device) -> bool {
    let Some(abs_axes) = device.supported_absolute_axes() else {
        return false;
    };
    abs_axes.contains(AbsoluteAxisType::ABS_MT_SLOT)
        && abs_axes.contains(AbsoluteAxisType::ABS_MT_POSITION_X)
        && abs_axes.contains(AbsoluteAxisType::ABS_MT_POSITION_Y)
}

/// Blocking event loop - reads from the device and queues gestures.
fn read_loop(
    mut device: Device,
    detector: &mut GestureDetector,
    sender: &SyncSender<Gesture>,
    running: &Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        let events = match device.fetch_events() {
            Ok(iter) => iter.collect::<Vec<_>>(),
            Err(e) => {
                if running.load(Ordering::Relaxed) {
                    error!("Failed to read input device: {e}");
                }
                return;
            }
        };

        for event in &events {
            let Some(te) = classify_event(event) else {
                continue;
            };
            let Some(gesture) = detector.handle_event(&te, Instant::now()) else {
                continue;
            };
            debug!("Detected {gesture}");
            match sender.try_send(gesture) {
                Ok(()) => {}
                Err(TrySendError::Full(gesture)) => {
                    warn!("Gesture queue full, dropping {gesture}");
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

// -- Dispatch -------------------------------------------------

/// Dispatch on a separate thread so a slow command does not hold up the
/// next gesture.
fn spawn_dispatch(gesture: Gesture, config: Arc<AppConfig>, windows: Arc<dyn WindowClassSource>) {
    let spawned = thread::Builder::new()
        .name("padgestr-dispatch".to_string())
        .spawn(move || dispatch_gesture(gesture, &config, windows.as_ref()));
    if let Err(e) = spawned {
        error!("Failed to dispatch {gesture}: {e}");
    }
}

/// Run the command for `gesture` in the focused window's context, falling
/// back to the global actions.  Returns whether a command ran successfully.
pub fn dispatch_gesture(
    gesture: Gesture,
    config: &AppConfig,
    windows: &dyn WindowClassSource,
) -> bool {
    let class = match windows.active_window_class() {
        Ok(class) => Some(class),
        Err(e) => {
            debug!("Active window lookup failed: {e}");
            None
        }
    };

    let Some(command) = resolve_action(gesture, &config.actions, class.as_deref()) else {
        debug!(
            "No action for {gesture} in '{}'",
            class.as_deref().unwrap_or("")
        );
        return false;
    };

    info!("{gesture}: {command}");
    run_command(command)
}

/// Run `command` to completion, logging failures.  Returns whether it
/// started and exited with status 0.
fn run_command(command: &str) -> bool {
    let argv = match parse_command(command) {
        Ok(argv) => argv,
        Err(e) => {
            error!("{e}");
            return false;
        }
    };

    match Command::new(&argv[0]).args(&argv[1..]).status() {
        Ok(status) if status.success() => {
            debug!("Command finished: {command}");
            true
        }
        Ok(status) => {
            warn!("Command '{command}' exited with {status}");
            false
        }
        Err(e) => {
            error!("Failed to run command '{command}': {e}");
            false
        }
    }
}

/// List all multi-touch capable devices.
pub fn list_touch_devices() -> ExitCode {
    println!("\n=== padgestr: Available Touchpad Devices ===\n");
    let mut touch_count = 0;

    for (path, device) in evdev::enumerate() {
        if !is_touch_device(&device) {
            continue;
        }

        touch_count += 1;
        println!(
            "Device {touch_count}:\n\
             \x20 Path:      {}\n\
             \x20 Name:      {}\n\
             \x20 Phys:      {}\n",
            path.display(),
            device.name().unwrap_or("unknown"),
            device.physical_path().unwrap_or("N/A"),
        );
    }

    if touch_count == 0 {
        println!(
            "No multi-touch devices found.\n\n\
             Troubleshooting:\n\
             \x20 - Run 'libinput list-devices' to see all devices\n\
             \x20 - Run as root or add yourself to the 'input' group"
        );
        return ExitCode::FAILURE;
    }

    println!(
        "Found {touch_count} touch device(s).\n\n\
         Add the device path to your gestures.toml:\n\
         \x20 [device]\n\
         \x20 path = \"<Path>\""
    );
    ExitCode::SUCCESS
}
