//! # Gamepad Module
//!
//! Gamepad input handling for teleoperation.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev
//! - Reading analog stick, trigger and button inputs on a background task
//! - Normalizing axes and applying deadzones
//! - Latching episode-end button presses

pub mod deadzone;
pub mod device;
pub mod state;

pub use device::EvdevGamepad;
pub use state::{AxisRange, GamepadEventMapper, GamepadState};

use crate::error::Result;
use crate::teleop::EpisodeEndStatus;

/// A running source of gamepad input.
///
/// Implemented by [`EvdevGamepad`] for real hardware and mocked in tests.
#[cfg_attr(test, mockall::automock)]
pub trait GamepadSource: Send {
    /// Opens the device and starts reading events.
    fn start(&mut self) -> Result<()>;

    /// Stops reading and releases the device.
    fn stop(&mut self);

    /// Whether events are still being read.
    fn is_running(&self) -> bool;

    /// Returns the latest input state.
    fn snapshot(&self) -> GamepadState;

    /// Returns and clears the latched episode-end status.
    fn take_episode_end_status(&mut self) -> Option<EpisodeEndStatus>;
}
