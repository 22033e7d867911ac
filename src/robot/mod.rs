//! # Robot Module
//!
//! Follower robot configs, looked up by their `type` name through
//! [`registry()`].

pub mod xiaoai;

pub use xiaoai::{MaxRelativeTarget, XiaoaiFollowerConfig};

use crate::error::Result;
use crate::registry::ConfigRegistry;
use crate::teleop::Action;

/// Configs of every registered robot.
#[derive(Debug, Clone, PartialEq)]
pub enum RobotConfig {
    Xiaoai(XiaoaiFollowerConfig),
}

impl RobotConfig {
    /// Registered `type` name of this config.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            RobotConfig::Xiaoai(_) => XiaoaiFollowerConfig::TYPE,
        }
    }

    /// Port the robot is attached to.
    #[must_use]
    pub fn port(&self) -> &str {
        match self {
            RobotConfig::Xiaoai(config) => &config.port,
        }
    }

    /// Validates the inner config.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        match self {
            RobotConfig::Xiaoai(config) => config.validate(),
        }
    }

    /// Applies the robot's relative-target safety limit to `action`.
    pub fn limit_action(&self, action: &mut Action) {
        match self {
            RobotConfig::Xiaoai(config) => config.limit_action(action),
        }
    }
}

/// Returns the robot config registry with every built-in type registered.
///
/// # Errors
///
/// Returns `DuplicateRegistration` if two built-ins share a name.
pub fn registry() -> Result<ConfigRegistry<RobotConfig>> {
    let mut registry = ConfigRegistry::new();
    registry.register_subclass(XiaoaiFollowerConfig::TYPE, |value| {
        XiaoaiFollowerConfig::from_toml(value).map(RobotConfig::Xiaoai)
    })?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XiaoaiError;

    #[test]
    fn test_registry_contains_xiaoai() {
        let registry = registry().unwrap();
        assert_eq!(registry.names(), vec!["xiaoai"]);
    }

    #[test]
    fn test_build_xiaoai() {
        let value: toml::Value =
            toml::from_str("type = 'xiaoai'\nport = '/dev/ttyACM0'\nid = 'xiaoai_1'").unwrap();
        let config = registry().unwrap().build(value).unwrap();

        assert_eq!(config.type_name(), "xiaoai");
        assert_eq!(config.port(), "/dev/ttyACM0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_unknown_robot() {
        let value: toml::Value = toml::from_str("type = 'so100'\nport = '/dev/ttyACM0'").unwrap();
        assert!(matches!(
            registry().unwrap().build(value),
            Err(XiaoaiError::UnknownType { .. })
        ));
    }
}
