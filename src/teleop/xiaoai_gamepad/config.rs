//! Configuration for the Xiaoai gamepad teleoperator.
//!
//! Registered under the name `xiaoai_gamepad`:
//!
//! ```toml
//! [teleop]
//! type = "xiaoai_gamepad"
//! gamepad_device = "/dev/input/js0"
//! joint_step_size = 5.0
//! deadzone = 0.1
//! smoothing_factor = 0.3
//! use_gripper = false
//!
//! [teleop.joint_mapping.axes]
//! "0" = "base_yaw"
//! "1" = "base_pitch"
//! "3" = "elbow_pitch"
//! "4" = "wrist_pitch"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, XiaoaiError};
use crate::joint::JointMapping;
use crate::teleop::smoothing::DEFAULT_SMOOTHING_FACTOR;

/// Xiaoai gamepad teleoperator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XiaoaiGamepadConfig {
    /// Gamepad device path. Empty means auto-detect.
    #[serde(default = "default_gamepad_device")]
    pub gamepad_device: String,

    /// Step scale, applied to the stick delta before smoothing and to the
    /// smoothed value after it.
    #[serde(default = "default_joint_step_size")]
    pub joint_step_size: f32,

    /// Stick deadzone as a fraction of travel.
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    /// Exponential smoothing factor. Smaller is smoother.
    #[serde(default = "default_smoothing_factor")]
    pub smoothing_factor: f32,

    /// Drive a gripper channel from the triggers.
    #[serde(default)]
    pub use_gripper: bool,

    /// Axis-to-joint table.
    #[serde(default)]
    pub joint_mapping: JointMapping,
}

fn default_gamepad_device() -> String { "/dev/input/js0".to_string() }
fn default_joint_step_size() -> f32 { 5.0 }
fn default_deadzone() -> f32 { 0.1 }
fn default_smoothing_factor() -> f32 { DEFAULT_SMOOTHING_FACTOR }

impl Default for XiaoaiGamepadConfig {
    fn default() -> Self {
        Self {
            gamepad_device: default_gamepad_device(),
            joint_step_size: default_joint_step_size(),
            deadzone: default_deadzone(),
            smoothing_factor: default_smoothing_factor(),
            use_gripper: false,
            joint_mapping: JointMapping::default(),
        }
    }
}

impl XiaoaiGamepadConfig {
    /// Registered config type name.
    pub const TYPE: &'static str = "xiaoai_gamepad";

    /// Builds the config from its `[teleop]` table and validates it.
    ///
    /// # Errors
    ///
    /// - `Config`: the table has unknown types for known keys
    /// - `InvalidConfig`: a value is out of range
    pub fn from_toml(value: toml::Value) -> Result<Self> {
        let config: Self = value.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if !self.joint_step_size.is_finite() || self.joint_step_size <= 0.0 {
            return Err(XiaoaiError::InvalidConfig(
                "joint_step_size must be a positive number".to_string(),
            ));
        }

        if !(0.0..0.5).contains(&self.deadzone) {
            return Err(XiaoaiError::InvalidConfig(
                "deadzone must be between 0.0 (inclusive) and 0.5 (exclusive)".to_string(),
            ));
        }

        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(XiaoaiError::InvalidConfig(
                "smoothing_factor must be greater than 0.0 and at most 1.0".to_string(),
            ));
        }

        self.joint_mapping.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::Joint;

    #[test]
    fn test_default_functions() {
        assert_eq!(default_gamepad_device(), "/dev/input/js0");
        assert_eq!(default_joint_step_size(), 5.0);
        assert_eq!(default_deadzone(), 0.1);
        assert_eq!(default_smoothing_factor(), 0.3);
    }

    #[test]
    fn test_default_config() {
        let config = XiaoaiGamepadConfig::default();
        assert!(!config.use_gripper);
        assert_eq!(config.joint_mapping, JointMapping::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_only_type() {
        let value: toml::Value = toml::from_str("type = 'xiaoai_gamepad'").unwrap();
        let config = XiaoaiGamepadConfig::from_toml(value).unwrap();
        assert_eq!(config, XiaoaiGamepadConfig::default());
    }

    #[test]
    fn test_from_toml_overrides() {
        let toml_content = r#"
type = "xiaoai_gamepad"
gamepad_device = ""
joint_step_size = 2.5
deadzone = 0.05
use_gripper = true

[joint_mapping.axes]
"3" = "base_yaw"
"4" = "base_pitch"
"0" = "elbow_pitch"
"1" = "wrist_pitch"
"#;
        let value: toml::Value = toml::from_str(toml_content).unwrap();
        let config = XiaoaiGamepadConfig::from_toml(value).unwrap();
        assert_eq!(config.gamepad_device, "");
        assert_eq!(config.joint_step_size, 2.5);
        assert_eq!(config.deadzone, 0.05);
        assert!(config.use_gripper);
        assert_eq!(config.joint_mapping.axis_for(Joint::BaseYaw), 3);
    }

    #[test]
    fn test_from_toml_wrong_type() {
        let value: toml::Value = toml::from_str("joint_step_size = 'fast'").unwrap();
        assert!(matches!(
            XiaoaiGamepadConfig::from_toml(value),
            Err(XiaoaiError::Config(_))
        ));
    }

    #[test]
    fn test_from_toml_invalid_value() {
        let value: toml::Value = toml::from_str("deadzone = 0.9").unwrap();
        assert!(matches!(
            XiaoaiGamepadConfig::from_toml(value),
            Err(XiaoaiError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_step_size_zero() {
        let mut config = XiaoaiGamepadConfig::default();
        config.joint_step_size = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_step_size_nan() {
        let mut config = XiaoaiGamepadConfig::default();
        config.joint_step_size = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_negative() {
        let mut config = XiaoaiGamepadConfig::default();
        config.deadzone = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_upper_bound_exclusive() {
        let mut config = XiaoaiGamepadConfig::default();
        config.deadzone = 0.5;
        assert!(config.validate().is_err());

        config.deadzone = 0.49;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deadzone_zero_ok() {
        let mut config = XiaoaiGamepadConfig::default();
        config.deadzone = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_smoothing_factor_bounds() {
        let mut config = XiaoaiGamepadConfig::default();
        config.smoothing_factor = 0.0;
        assert!(config.validate().is_err());

        config.smoothing_factor = 1.0;
        assert!(config.validate().is_ok());

        config.smoothing_factor = 1.01;
        assert!(config.validate().is_err());
    }
}
