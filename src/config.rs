//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! The `[teleop]` and `[robot]` tables are resolved through their config
//! registries by their `type` key; the remaining sections are plain structs.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, XiaoaiError};
use crate::robot::{self, RobotConfig};
use crate::teleop::{self, TeleoperatorConfig};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub teleop: TeleoperatorConfig,
    pub robot: RobotConfig,
    pub control: ControlConfig,
    pub recording: RecordingConfig,
}

/// File layout before the `[teleop]` and `[robot]` tables are resolved.
#[derive(Debug, Deserialize)]
struct RawConfig {
    teleop: toml::Value,
    robot: toml::Value,
    #[serde(default)]
    control: ControlConfig,
    #[serde(default)]
    recording: RecordingConfig,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ControlConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_log_interval_frames")]
    pub log_interval_frames: u64,
}

/// Episode recording configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RecordingConfig {
    #[serde(default = "default_recording_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

// Default value functions
fn default_fps() -> u32 { 30 }
fn default_log_interval_frames() -> u64 { 300 }

fn default_recording_enabled() -> bool { true }
fn default_log_dir() -> String { "./recordings".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            log_interval_frames: default_log_interval_frames(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: default_recording_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl ControlConfig {
    /// Control loop period derived from `fps`.
    #[must_use]
    pub fn period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - A `type` is not registered
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use xiaoai_teleop::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus file access.
    pub fn parse(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents)?;

        let config = Config {
            teleop: teleop::registry()?.build(raw.teleop)?,
            robot: robot::registry()?.build(raw.robot)?,
            control: raw.control,
            recording: raw.recording,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// * `Result<()>` - Ok if valid, Err if invalid
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        self.teleop.validate()?;
        self.robot.validate()?;

        // Validate control loop
        if self.control.fps == 0 || self.control.fps > 1000 {
            return Err(XiaoaiError::InvalidConfig(
                "fps must be between 1 and 1000".to_string(),
            ));
        }

        if self.control.log_interval_frames == 0 {
            return Err(XiaoaiError::InvalidConfig(
                "log_interval_frames must be greater than 0".to_string(),
            ));
        }

        // Validate recording configuration
        if self.recording.enabled && self.recording.log_dir.is_empty() {
            return Err(XiaoaiError::InvalidConfig(
                "recording log_dir cannot be empty when enabled".to_string(),
            ));
        }

        if self.recording.max_records_per_file == 0 {
            return Err(XiaoaiError::InvalidConfig(
                "max_records_per_file must be greater than 0".to_string(),
            ));
        }

        if self.recording.max_files_to_keep == 0 {
            return Err(XiaoaiError::InvalidConfig(
                "max_files_to_keep must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::Joint;
    use crate::robot::{MaxRelativeTarget, XiaoaiFollowerConfig};
    use crate::teleop::XiaoaiGamepadConfig;

    const MINIMAL: &str = r#"
[teleop]
type = "xiaoai_gamepad"

[robot]
type = "xiaoai"
port = "/dev/ttyACM0"
"#;

    fn create_valid_config() -> Config {
        Config {
            teleop: TeleoperatorConfig::XiaoaiGamepad(XiaoaiGamepadConfig::default()),
            robot: RobotConfig::Xiaoai(XiaoaiFollowerConfig::new("/dev/ttyACM0")),
            control: ControlConfig::default(),
            recording: RecordingConfig::default(),
        }
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_parse_minimal() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config, create_valid_config());
    }

    #[test]
    fn test_parse_full() {
        let toml_content = r#"
[teleop]
type = "xiaoai_gamepad"
gamepad_device = "/dev/input/event5"
joint_step_size = 3.0
use_gripper = true

[teleop.joint_mapping.axes]
"3" = "base_yaw"
"4" = "base_pitch"
"0" = "elbow_pitch"
"1" = "wrist_pitch"

[robot]
type = "xiaoai"
port = "/dev/ttyACM1"
id = "xiaoai_1"
use_degrees = true
max_relative_target = 10.0

[control]
fps = 60

[recording]
enabled = false
"#;
        let config = Config::parse(toml_content).unwrap();

        let TeleoperatorConfig::XiaoaiGamepad(teleop) = &config.teleop;
        assert_eq!(teleop.gamepad_device, "/dev/input/event5");
        assert_eq!(teleop.joint_step_size, 3.0);
        assert!(teleop.use_gripper);
        assert_eq!(teleop.joint_mapping.axis_for(Joint::WristPitch), 1);

        let RobotConfig::Xiaoai(robot) = &config.robot;
        assert_eq!(robot.port, "/dev/ttyACM1");
        assert!(robot.use_degrees);
        assert_eq!(robot.max_relative_target, Some(MaxRelativeTarget::All(10.0)));

        assert_eq!(config.control.fps, 60);
        assert_eq!(config.control.log_interval_frames, 300);
        assert!(!config.recording.enabled);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let result = Config::load(temp_file.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/config.toml"),
            Err(XiaoaiError::Io(_))
        ));
    }

    #[test]
    fn test_missing_robot_section() {
        let toml_content = r#"
[teleop]
type = "xiaoai_gamepad"
"#;
        assert!(matches!(Config::parse(toml_content), Err(XiaoaiError::Config(_))));
    }

    #[test]
    fn test_unknown_teleop_type() {
        let toml_content = r#"
[teleop]
type = "keyboard"

[robot]
type = "xiaoai"
port = "/dev/ttyACM0"
"#;
        match Config::parse(toml_content) {
            Err(XiaoaiError::UnknownType { name, registered }) => {
                assert_eq!(name, "keyboard");
                assert_eq!(registered, "xiaoai_gamepad");
            }
            other => panic!("Expected UnknownType, got: {:?}", other),
        }
    }

    #[test]
    fn test_trigger_axis_mapping_rejected() {
        let toml_content = r#"
[teleop]
type = "xiaoai_gamepad"

[teleop.joint_mapping.axes]
"0" = "base_yaw"
"1" = "base_pitch"
"2" = "elbow_pitch"
"4" = "wrist_pitch"

[robot]
type = "xiaoai"
port = "/dev/ttyACM0"
"#;
        assert!(Config::parse(toml_content).is_err());
    }

    #[test]
    fn test_invalid_teleop_value() {
        let toml_content = r#"
[teleop]
type = "xiaoai_gamepad"
smoothing_factor = 0.0

[robot]
type = "xiaoai"
port = "/dev/ttyACM0"
"#;
        assert!(matches!(Config::parse(toml_content), Err(XiaoaiError::InvalidConfig(_))));
    }

    #[test]
    fn test_fps_zero() {
        let mut config = create_valid_config();
        config.control.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fps_too_high() {
        let mut config = create_valid_config();
        config.control.fps = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_interval_zero() {
        let mut config = create_valid_config();
        config.control.log_interval_frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = create_valid_config();
        config.recording.enabled = true;
        config.recording.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = create_valid_config();
        config.recording.enabled = false;
        config.recording.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_records_per_file_zero() {
        let mut config = create_valid_config();
        config.recording.max_records_per_file = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_files_to_keep_zero() {
        let mut config = create_valid_config();
        config.recording.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_control_period() {
        let control = ControlConfig { fps: 50, log_interval_frames: 1 };
        assert_eq!(control.period(), std::time::Duration::from_millis(20));
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_fps(), 30);
        assert_eq!(default_log_interval_frames(), 300);
        assert_eq!(default_recording_enabled(), true);
        assert_eq!(default_log_dir(), "./recordings");
        assert_eq!(default_max_records_per_file(), 10000);
        assert_eq!(default_max_files_to_keep(), 10);
    }
}
