//! # Joint Module
//!
//! Names the four joints of the Xiaoai arm and maps joystick axes onto them.
//!
//! ## Default Axis Assignments
//!
//! | Axis | evdev Code | Stick | Joint |
//! |------|------------|-------|-------|
//! | 0 | ABS_X | Left Stick X | base_yaw |
//! | 1 | ABS_Y | Left Stick Y | base_pitch |
//! | 3 | ABS_RX | Right Stick X | elbow_pitch |
//! | 4 | ABS_RY | Right Stick Y | wrist_pitch |
//!
//! Axis indices are the Linux `ABS_*` codes, which is also the numbering
//! the joystick (`/dev/input/js*`) interface uses for Xbox-style pads.
//! The triggers (2 = `ABS_Z`, 5 = `ABS_RZ`) rest at one end of their travel
//! and cannot drive a joint.
//!
//! ## Usage
//!
//! ```
//! use xiaoai_teleop::joint::{Joint, JointMapping};
//!
//! let mapping = JointMapping::default();
//! assert_eq!(mapping.axis_for(Joint::ElbowPitch), 3);
//! assert_eq!(mapping.joint_for(1), Some(Joint::BasePitch));
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, XiaoaiError};
use crate::gamepad::state::{AXIS_TRIGGER_LEFT, AXIS_TRIGGER_RIGHT};

/// Number of arm joints driven by the teleoperator.
pub const JOINT_COUNT: usize = 4;

/// Highest axis code (exclusive) accepted in a mapping.
pub const MAX_AXIS_CODE: u16 = 64;

/// Joints of the Xiaoai 4-DOF arm, in action order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    /// Base rotation around the vertical axis.
    BaseYaw,
    /// Shoulder pitch at the base.
    BasePitch,
    /// Elbow pitch.
    ElbowPitch,
    /// Wrist pitch.
    WristPitch,
}

impl Joint {
    /// All joints in action order.
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::BaseYaw,
        Joint::BasePitch,
        Joint::ElbowPitch,
        Joint::WristPitch,
    ];

    /// Returns the snake_case joint name.
    ///
    /// # Examples
    ///
    /// ```
    /// use xiaoai_teleop::joint::Joint;
    ///
    /// assert_eq!(Joint::WristPitch.name(), "wrist_pitch");
    /// ```
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Joint::BaseYaw => "base_yaw",
            Joint::BasePitch => "base_pitch",
            Joint::ElbowPitch => "elbow_pitch",
            Joint::WristPitch => "wrist_pitch",
        }
    }

    /// Position of the joint in [`Joint::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Action key for this joint (`<name>.pos`).
    #[must_use]
    pub fn action_key(self) -> String {
        format!("{}.pos", self.name())
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Joint {
    type Err = XiaoaiError;

    fn from_str(s: &str) -> Result<Self> {
        Joint::ALL
            .into_iter()
            .find(|joint| joint.name() == s)
            .ok_or_else(|| XiaoaiError::InvalidConfig(format!("unknown joint '{}'", s)))
    }
}

/// Static table from joystick axis code to arm joint.
///
/// Written in TOML as:
///
/// ```toml
/// [teleop.joint_mapping.axes]
/// "0" = "base_yaw"
/// "1" = "base_pitch"
/// "3" = "elbow_pitch"
/// "4" = "wrist_pitch"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointMapping {
    /// Axis code per joint, indexed by [`Joint::index`].
    axes: [u16; JOINT_COUNT],
}

impl Default for JointMapping {
    fn default() -> Self {
        Self { axes: [0, 1, 3, 4] }
    }
}

impl JointMapping {
    /// Builds a mapping from `(axis, joint)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a joint is missing or mapped twice, if an
    /// axis is used twice, or if an axis code is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use xiaoai_teleop::joint::{Joint, JointMapping};
    ///
    /// let mapping = JointMapping::from_pairs([
    ///     (3, Joint::BaseYaw),
    ///     (4, Joint::BasePitch),
    ///     (0, Joint::ElbowPitch),
    ///     (1, Joint::WristPitch),
    /// ])?;
    /// assert_eq!(mapping.axis_for(Joint::BaseYaw), 3);
    /// # Ok::<(), xiaoai_teleop::error::XiaoaiError>(())
    /// ```
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u16, Joint)>,
    {
        let mut axes: [Option<u16>; JOINT_COUNT] = [None; JOINT_COUNT];

        for (axis, joint) in pairs {
            let slot = &mut axes[joint.index()];
            if slot.is_some() {
                return Err(XiaoaiError::InvalidConfig(format!(
                    "joint '{}' is mapped to more than one axis",
                    joint
                )));
            }
            *slot = Some(axis);
        }

        let mut resolved = [0u16; JOINT_COUNT];
        for joint in Joint::ALL {
            resolved[joint.index()] = axes[joint.index()].ok_or_else(|| {
                XiaoaiError::InvalidConfig(format!("joint '{}' has no axis mapping", joint))
            })?;
        }

        let mapping = Self { axes: resolved };
        mapping.validate()?;
        Ok(mapping)
    }

    /// Returns the axis code that drives `joint`.
    #[must_use]
    pub fn axis_for(&self, joint: Joint) -> u16 {
        self.axes[joint.index()]
    }

    /// Returns the joint driven by `axis`, if any.
    #[must_use]
    pub fn joint_for(&self, axis: u16) -> Option<Joint> {
        Joint::ALL.into_iter().find(|joint| self.axis_for(*joint) == axis)
    }

    /// Iterates `(joint, axis)` pairs in joint order.
    pub fn iter(&self) -> impl Iterator<Item = (Joint, u16)> + '_ {
        Joint::ALL.into_iter().map(|joint| (joint, self.axis_for(joint)))
    }

    /// Checks that axis codes are unique and in range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        for (i, &axis) in self.axes.iter().enumerate() {
            if axis >= MAX_AXIS_CODE {
                return Err(XiaoaiError::InvalidConfig(format!(
                    "axis {} is out of range (must be 0-{})",
                    axis,
                    MAX_AXIS_CODE - 1
                )));
            }
            if axis == AXIS_TRIGGER_LEFT || axis == AXIS_TRIGGER_RIGHT {
                return Err(XiaoaiError::InvalidConfig(format!(
                    "axis {} is a trigger and cannot drive a joint",
                    axis
                )));
            }
            if self.axes[..i].contains(&axis) {
                return Err(XiaoaiError::InvalidConfig(format!(
                    "axis {} is mapped to more than one joint",
                    axis
                )));
            }
        }
        Ok(())
    }
}

/// On-disk shape of the mapping: `{ axes = { "<code>" = "<joint>" } }`.
#[derive(Serialize, Deserialize)]
struct JointMappingTable {
    axes: BTreeMap<String, Joint>,
}

impl Serialize for JointMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let axes = self
            .iter()
            .map(|(joint, axis)| (axis.to_string(), joint))
            .collect();
        JointMappingTable { axes }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JointMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let table = JointMappingTable::deserialize(deserializer)?;
        let mut pairs = Vec::with_capacity(table.axes.len());
        for (key, joint) in table.axes {
            let axis: u16 = key
                .parse()
                .map_err(|_| D::Error::custom(format!("axis key '{}' is not a number", key)))?;
            pairs.push((axis, joint));
        }
        JointMapping::from_pairs(pairs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_order_and_names() {
        let names: Vec<_> = Joint::ALL.iter().map(|j| j.name()).collect();
        assert_eq!(names, ["base_yaw", "base_pitch", "elbow_pitch", "wrist_pitch"]);
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
        }
    }

    #[test]
    fn test_joint_action_key() {
        assert_eq!(Joint::BaseYaw.action_key(), "base_yaw.pos");
    }

    #[test]
    fn test_joint_from_str() {
        assert_eq!("elbow_pitch".parse::<Joint>().unwrap(), Joint::ElbowPitch);
        assert!("gripper".parse::<Joint>().is_err());
    }

    #[test]
    fn test_default_mapping() {
        let mapping = JointMapping::default();
        assert_eq!(mapping.axis_for(Joint::BaseYaw), 0);
        assert_eq!(mapping.axis_for(Joint::BasePitch), 1);
        assert_eq!(mapping.axis_for(Joint::ElbowPitch), 3);
        assert_eq!(mapping.axis_for(Joint::WristPitch), 4);
        assert_eq!(mapping.joint_for(2), None);
        assert!(mapping.validate().is_ok());
    }

    #[test]
    fn test_from_pairs_missing_joint() {
        let result = JointMapping::from_pairs([
            (0, Joint::BaseYaw),
            (1, Joint::BasePitch),
            (3, Joint::ElbowPitch),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_pairs_duplicate_joint() {
        let result = JointMapping::from_pairs([
            (0, Joint::BaseYaw),
            (1, Joint::BaseYaw),
            (3, Joint::ElbowPitch),
            (4, Joint::WristPitch),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_pairs_duplicate_axis() {
        let result = JointMapping::from_pairs([
            (0, Joint::BaseYaw),
            (0, Joint::BasePitch),
            (3, Joint::ElbowPitch),
            (4, Joint::WristPitch),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_pairs_axis_out_of_range() {
        let result = JointMapping::from_pairs([
            (0, Joint::BaseYaw),
            (1, Joint::BasePitch),
            (3, Joint::ElbowPitch),
            (MAX_AXIS_CODE, Joint::WristPitch),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_pairs_rejects_trigger_axes() {
        for trigger in [AXIS_TRIGGER_LEFT, AXIS_TRIGGER_RIGHT] {
            let result = JointMapping::from_pairs([
                (0, Joint::BaseYaw),
                (1, Joint::BasePitch),
                (trigger, Joint::ElbowPitch),
                (4, Joint::WristPitch),
            ]);
            assert!(result.is_err(), "axis {} should be rejected", trigger);
        }
    }

    #[test]
    fn test_joint_serde_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            joint: Joint,
        }

        let text = toml::to_string(&Wrapper { joint: Joint::ElbowPitch }).unwrap();
        assert!(text.contains("\"elbow_pitch\""));
        let back: Wrapper = toml::from_str("joint = \"wrist_pitch\"").unwrap();
        assert_eq!(back.joint, Joint::WristPitch);
        assert!(toml::from_str::<Wrapper>("joint = \"gripper\"").is_err());
    }

    #[test]
    fn test_mapping_from_toml() {
        let toml_content = r#"
[axes]
"3" = "base_yaw"
"4" = "base_pitch"
"0" = "elbow_pitch"
"1" = "wrist_pitch"
"#;
        let mapping: JointMapping = toml::from_str(toml_content).unwrap();
        assert_eq!(mapping.axis_for(Joint::BaseYaw), 3);
        assert_eq!(mapping.axis_for(Joint::WristPitch), 1);
    }

    #[test]
    fn test_mapping_from_toml_rejects_bad_key() {
        let toml_content = r#"
[axes]
"left" = "base_yaw"
"#;
        assert!(toml::from_str::<JointMapping>(toml_content).is_err());
    }

    #[test]
    fn test_mapping_serializes_with_string_keys() {
        let text = toml::to_string(&JointMapping::default()).unwrap();
        let back: JointMapping = toml::from_str(&text).unwrap();
        assert_eq!(back, JointMapping::default());
        assert!(text.contains("base_yaw"));
    }
}
