//! # Evdev Gamepad Module
//!
//! Detects and opens a gamepad through the Linux evdev interface and reads
//! its events on a background tokio task.
//!
//! ## Device Selection
//!
//! - A configured `/dev/input/event*` path is opened directly.
//! - An empty path, or a legacy joystick node (`/dev/input/js*`, which evdev
//!   cannot read), falls back to auto-detection: the first
//!   `/dev/input/event*` device, in path order, that reports a left stick
//!   (`ABS_X`/`ABS_Y`) and a south face button (`BTN_SOUTH`).

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::{AxisRange, GamepadEventMapper, GamepadState};
use super::GamepadSource;
use crate::error::{Result, XiaoaiError};
use crate::teleop::EpisodeEndStatus;

/// Directory scanned for event devices.
const INPUT_DIR: &str = "/dev/input";

/// Axis codes whose ranges are read from the device on open.
const TRACKED_AXES: [AbsoluteAxisType; 6] = [
    AbsoluteAxisType::ABS_X,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_Z,
    AbsoluteAxisType::ABS_RX,
    AbsoluteAxisType::ABS_RY,
    AbsoluteAxisType::ABS_RZ,
];

/// Gamepad read through evdev.
///
/// Events are folded into a shared [`GamepadEventMapper`] by a tokio task
/// spawned in [`GamepadSource::start`], so `start` must be called from
/// inside a tokio runtime.
pub struct EvdevGamepad {
    /// Configured device path (`None` = auto-detect).
    configured_path: Option<PathBuf>,
    /// Path actually opened.
    device_path: Option<PathBuf>,
    mapper: Arc<Mutex<GamepadEventMapper>>,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for EvdevGamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevGamepad")
            .field("configured_path", &self.configured_path)
            .field("device_path", &self.device_path)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EvdevGamepad {
    /// Creates an unopened gamepad handle.
    ///
    /// An empty `device_path` means auto-detect.
    #[must_use]
    pub fn new(device_path: &str) -> Self {
        let configured_path = if device_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(device_path))
        };

        Self {
            configured_path,
            device_path: None,
            mapper: Arc::new(Mutex::new(GamepadEventMapper::new())),
            running: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }

    /// Returns the path of the opened device, if started.
    #[must_use]
    pub fn device_path(&self) -> Option<&Path> {
        self.device_path.as_deref()
    }

    fn lock_mapper(&self) -> MutexGuard<'_, GamepadEventMapper> {
        self.mapper.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Opens the configured device, or auto-detects one.
    fn open_device(&self) -> Result<(PathBuf, Device)> {
        match &self.configured_path {
            Some(path) if !is_joystick_node(path) => {
                let device = Device::open(path).map_err(|e| {
                    XiaoaiError::Gamepad(format!("Failed to open {}: {}", path.display(), e))
                })?;
                Ok((path.clone(), device))
            }
            Some(path) => {
                warn!(
                    "{} is a joystick node, not an evdev device; auto-detecting instead",
                    path.display()
                );
                detect_gamepad(Path::new(INPUT_DIR))
            }
            None => detect_gamepad(Path::new(INPUT_DIR)),
        }
    }
}

impl GamepadSource for EvdevGamepad {
    fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| XiaoaiError::Gamepad(format!("No tokio runtime available: {}", e)))?;

        let (path, device) = self.open_device()?;
        info!(
            "Opened gamepad '{}' at {}",
            device.name().unwrap_or("unknown"),
            path.display()
        );

        let ranges = read_axis_ranges(&device);
        *self.lock_mapper() = GamepadEventMapper::with_ranges(ranges);

        // Registering the fd with the reactor needs the runtime context.
        let _guard = runtime.enter();
        let mut stream = device.into_event_stream().map_err(|e| {
            XiaoaiError::Gamepad(format!("Failed to stream events from {}: {}", path.display(), e))
        })?;

        let mapper = Arc::clone(&self.mapper);
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        let reader = runtime.spawn(async move {
            loop {
                match stream.next_event().await {
                    Ok(event) => {
                        mapper
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .process_event(&event);
                    }
                    Err(e) => {
                        warn!("Gamepad read failed, stopping reader: {}", e);
                        break;
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        self.reader = Some(reader);
        self.device_path = Some(path);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.running.store(false, Ordering::SeqCst);
        self.lock_mapper().reset();

        if let Some(path) = self.device_path.take() {
            info!("Closed gamepad at {}", path.display());
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> GamepadState {
        self.lock_mapper().state_snapshot()
    }

    fn take_episode_end_status(&mut self) -> Option<EpisodeEndStatus> {
        self.lock_mapper().take_episode_end_status()
    }
}

impl Drop for EvdevGamepad {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Whether `path` names a legacy joystick node (`js0`, `js1`, ...).
fn is_joystick_node(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with("js"))
        .unwrap_or(false)
}

/// Whether an opened device looks like a gamepad.
fn looks_like_gamepad(device: &Device) -> bool {
    let has_stick = device
        .supported_absolute_axes()
        .map(|axes| {
            axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
        })
        .unwrap_or(false);
    let has_face_button = device
        .supported_keys()
        .map(|keys| keys.contains(Key::BTN_SOUTH))
        .unwrap_or(false);

    has_stick && has_face_button
}

/// Scans `input_dir` for the first `event*` device that looks like a gamepad.
///
/// # Errors
///
/// - `Gamepad`: the directory cannot be read
/// - `GamepadNotFound`: no matching device
pub fn detect_gamepad(input_dir: &Path) -> Result<(PathBuf, Device)> {
    if !input_dir.exists() {
        return Err(XiaoaiError::Gamepad(format!(
            "{} directory not found",
            input_dir.display()
        )));
    }

    let mut entries: Vec<_> = std::fs::read_dir(input_dir)
        .map_err(|e| {
            XiaoaiError::Gamepad(format!("Failed to read {}: {}", input_dir.display(), e))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| XiaoaiError::Gamepad(format!("Failed to read directory entry: {}", e)))?;

    // Sort entries for deterministic device selection when multiple pads are connected
    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let path = entry.path();

        let is_event_node = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with("event"))
            .unwrap_or(false);
        if !is_event_node {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                debug!(
                    "Found input device: {} ({})",
                    path.display(),
                    device.name().unwrap_or("unnamed")
                );
                if looks_like_gamepad(&device) {
                    return Ok((path, device));
                }
            }
            Err(e) => {
                // Permission denied or other errors - skip device
                debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    Err(XiaoaiError::GamepadNotFound)
}

/// Reads the raw ranges of the stick and trigger axes the device supports.
fn read_axis_ranges(device: &Device) -> Vec<(u16, AxisRange)> {
    let supported = match device.supported_absolute_axes() {
        Some(axes) => axes,
        None => return Vec::new(),
    };

    let abs_state = match device.get_abs_state() {
        Ok(state) => state,
        Err(e) => {
            warn!("Could not read axis ranges, using defaults: {}", e);
            return Vec::new();
        }
    };

    TRACKED_AXES
        .iter()
        .filter(|axis| supported.contains(**axis))
        .map(|axis| {
            let info = &abs_state[axis.0 as usize];
            let range = AxisRange::new(info.minimum, info.maximum);
            debug!("Axis {} range {}..={}", axis.0, range.min, range.max);
            (axis.0, range)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_means_auto_detect() {
        let gamepad = EvdevGamepad::new("");
        assert!(gamepad.configured_path.is_none());
        assert!(gamepad.device_path().is_none());
        assert!(!gamepad.is_running());
    }

    #[test]
    fn test_joystick_node_detection() {
        assert!(is_joystick_node(Path::new("/dev/input/js0")));
        assert!(!is_joystick_node(Path::new("/dev/input/event3")));
    }

    #[test]
    fn test_detect_in_missing_dir() {
        let result = detect_gamepad(Path::new("/nonexistent/input"));
        match result {
            Err(XiaoaiError::Gamepad(msg)) => assert!(msg.contains("/nonexistent/input")),
            other => panic!("Expected Gamepad error, got: {:?}", other.map(|(p, _)| p)),
        }
    }

    #[test]
    fn test_detect_in_dir_without_devices() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("event0"), b"not a device").unwrap();
        std::fs::write(dir.path().join("mouse0"), b"").unwrap();

        let result = detect_gamepad(dir.path());
        assert!(matches!(result, Err(XiaoaiError::GamepadNotFound)));
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let mut gamepad = EvdevGamepad::new("/dev/input/event-missing");
        let result = gamepad.start();
        assert!(matches!(result, Err(XiaoaiError::Gamepad(_))));
        assert!(!gamepad.is_running());
    }

    #[tokio::test]
    async fn test_start_with_missing_device_fails() {
        let mut gamepad = EvdevGamepad::new("/dev/input/event-missing");
        let result = gamepad.start();
        match result {
            Err(XiaoaiError::Gamepad(msg)) => assert!(msg.contains("event-missing")),
            other => panic!("Expected Gamepad error, got: {:?}", other),
        }
        assert!(!gamepad.is_running());
    }

    #[test]
    fn test_stop_when_not_started_is_noop() {
        let mut gamepad = EvdevGamepad::new("");
        gamepad.stop();
        assert!(!gamepad.is_running());
        assert_eq!(gamepad.snapshot(), GamepadState::default());
    }

    // Integration test - only runs with real hardware
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_start_with_real_hardware() {
        let mut gamepad = EvdevGamepad::new("");
        gamepad.start().expect("Gamepad not found");
        assert!(gamepad.is_running());
        assert!(gamepad.device_path().is_some());

        println!("Move a stick within 3 seconds...");
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        println!("State: {:?}", gamepad.snapshot());

        gamepad.stop();
        assert!(!gamepad.is_running());
    }
}
