//! # Smoothing Module
//!
//! Per-joint exponential smoothing of joystick deltas.
//!
//! Each channel keeps the last filtered value and blends new input into it:
//!
//! `filtered = alpha * new + (1 - alpha) * filtered`
//!
//! - `alpha = 1.0`: no smoothing, output follows input
//! - `alpha = 0.3`: default, noticeably softer starts and stops
//! - `alpha = 0.0`: output frozen at its previous value
//!
//! ## Usage
//!
//! ```
//! use xiaoai_teleop::joint::Joint;
//! use xiaoai_teleop::teleop::smoothing::ExponentialSmoother;
//!
//! let mut smoother = ExponentialSmoother::new(0.5);
//! assert!((smoother.update(Joint::BaseYaw, 1.0) - 0.5).abs() < 1e-6);
//! assert!((smoother.update(Joint::BaseYaw, 1.0) - 0.75).abs() < 1e-6);
//! ```

use crate::joint::{Joint, JOINT_COUNT};

/// Default smoothing factor. Smaller is smoother.
pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.3;

/// Exponential smoothing filter over one scalar channel per joint.
#[derive(Debug, Clone)]
pub struct ExponentialSmoother {
    /// Smoothing factor (0.0 to 1.0).
    alpha: f32,
    /// Last filtered value per joint, indexed by [`Joint::index`].
    filtered: [f32; JOINT_COUNT],
}

impl Default for ExponentialSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_FACTOR)
    }
}

impl ExponentialSmoother {
    /// Creates a smoother with all channels at rest.
    ///
    /// `alpha` is clamped to 0.0..=1.0.
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            filtered: [0.0; JOINT_COUNT],
        }
    }

    /// Returns the configured smoothing factor.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Blends `new` into the channel for `joint` and returns the filtered value.
    pub fn update(&mut self, joint: Joint, new: f32) -> f32 {
        let slot = &mut self.filtered[joint.index()];
        *slot = self.alpha * new + (1.0 - self.alpha) * *slot;
        *slot
    }

    /// Returns the current filtered value for `joint` without updating it.
    #[must_use]
    pub fn value(&self, joint: Joint) -> f32 {
        self.filtered[joint.index()]
    }

    /// Puts every channel back at rest.
    pub fn reset(&mut self) {
        self.filtered = [0.0; JOINT_COUNT];
    }
}
