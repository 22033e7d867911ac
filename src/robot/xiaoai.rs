//! Configuration for the Xiaoai 4-DOF follower arm.
//!
//! Registered under the name `xiaoai`. The motor-bus driver that consumes
//! this config lives outside this crate; only the record and the
//! relative-target safety limit are defined here.
//!
//! ```toml
//! [robot]
//! type = "xiaoai"
//! port = "/dev/ttyACM0"
//! id = "xiaoai_1"
//! use_degrees = true
//! max_relative_target = 10.0     # or one value per joint: [10.0, 10.0, 15.0, 20.0]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Result, XiaoaiError};
use crate::joint::{Joint, JOINT_COUNT};
use crate::teleop::Action;

/// Limit on the magnitude of a relative joint target, for safety.
///
/// A scalar applies to every joint; a list gives one limit per joint in
/// [`Joint::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxRelativeTarget {
    All(f32),
    PerJoint(Vec<f32>),
}

impl MaxRelativeTarget {
    /// Limit for `joint`. Missing per-joint entries mean no limit.
    #[must_use]
    pub fn limit(&self, joint: Joint) -> Option<f32> {
        match self {
            MaxRelativeTarget::All(limit) => Some(*limit),
            MaxRelativeTarget::PerJoint(limits) => limits.get(joint.index()).copied(),
        }
    }

    /// Clamps every joint entry of `action` to ±limit. Other entries
    /// (such as a gripper channel) and joints without a positive limit are
    /// left alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use xiaoai_teleop::robot::MaxRelativeTarget;
    /// use xiaoai_teleop::teleop::Action;
    ///
    /// let mut action = Action::uniform(12.0);
    /// MaxRelativeTarget::All(5.0).clamp(&mut action);
    /// assert_eq!(action.get("base_yaw.pos"), Some(5.0));
    /// ```
    pub fn clamp(&self, action: &mut Action) {
        for joint in Joint::ALL {
            let limit = match self.limit(joint) {
                Some(limit) if limit > 0.0 => limit,
                _ => continue,
            };
            if let Some(value) = action.get_mut(&joint.action_key()) {
                let clamped = value.clamp(-limit, limit);
                if clamped != *value {
                    debug!("Clamped {} target {:.3} to {:.3}", joint, *value, clamped);
                }
                *value = clamped;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let limits: &[f32] = match self {
            MaxRelativeTarget::All(limit) => std::slice::from_ref(limit),
            MaxRelativeTarget::PerJoint(limits) => {
                if limits.len() != JOINT_COUNT {
                    return Err(XiaoaiError::InvalidConfig(format!(
                        "max_relative_target must have {} entries (one per joint), got {}",
                        JOINT_COUNT,
                        limits.len()
                    )));
                }
                limits
            }
        };

        if limits.iter().any(|limit| !limit.is_finite() || *limit <= 0.0) {
            return Err(XiaoaiError::InvalidConfig(
                "max_relative_target values must be positive numbers".to_string(),
            ));
        }
        Ok(())
    }
}

/// Xiaoai follower arm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XiaoaiFollowerConfig {
    /// Serial port the arm is connected to.
    pub port: String,

    /// Identifier of this arm, used to name its calibration file.
    #[serde(default)]
    pub id: Option<String>,

    /// Directory holding calibration files.
    #[serde(default)]
    pub calibration_dir: Option<PathBuf>,

    #[serde(default = "default_disable_torque_on_disconnect")]
    pub disable_torque_on_disconnect: bool,

    #[serde(default)]
    pub max_relative_target: Option<MaxRelativeTarget>,

    /// Report joint positions in degrees instead of the normalized range.
    #[serde(default)]
    pub use_degrees: bool,
}

fn default_disable_torque_on_disconnect() -> bool { true }

impl XiaoaiFollowerConfig {
    /// Registered config type name.
    pub const TYPE: &'static str = "xiaoai";

    /// Creates a config for `port` with every other field at its default.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            id: None,
            calibration_dir: None,
            disable_torque_on_disconnect: default_disable_torque_on_disconnect(),
            max_relative_target: None,
            use_degrees: false,
        }
    }

    /// Builds the config from its `[robot]` table and validates it.
    ///
    /// # Errors
    ///
    /// - `Config`: `port` is missing or a key has the wrong type
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
        if self.port.is_empty() {
            return Err(XiaoaiError::InvalidConfig("robot port cannot be empty".to_string()));
        }

        if matches!(&self.id, Some(id) if id.is_empty()) {
            return Err(XiaoaiError::InvalidConfig("robot id cannot be empty when set".to_string()));
        }

        if let Some(limit) = &self.max_relative_target {
            limit.validate()?;
        }

        Ok(())
    }

    /// Applies `max_relative_target`, if set, to a relative action.
    pub fn limit_action(&self, action: &mut Action) {
        if let Some(limit) = &self.max_relative_target {
            limit.clamp(action);
        }
    }
}
