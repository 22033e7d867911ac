//! # Deadzone
//!
//! Removes stick drift near center. Values within the deadzone are mapped to
//! 0.0 and the remaining travel is rescaled so full deflection still reaches
//! ±1.0.
//!
//! ```
//! use xiaoai_teleop::gamepad::deadzone::apply_deadzone;
//!
//! assert_eq!(apply_deadzone(0.05, 0.1), 0.0);
//! assert!((apply_deadzone(1.0, 0.1) - 1.0).abs() < 1e-6);
//! assert!((apply_deadzone(-0.55, 0.1) - (-0.5)).abs() < 1e-6);
//! ```

/// Applies a symmetric deadzone to a normalized value (-1.0 to 1.0).
#[must_use]
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    let abs_value = value.abs();

    if abs_value <= deadzone {
        return 0.0;
    }

    // Scale remaining range to 0..1
    let scaled = ((abs_value - deadzone) / (1.0 - deadzone)).min(1.0);
    value.signum() * scaled
}
