//! # Error Types
//!
//! Custom error types for Xiaoai Teleop using `thiserror`.

use thiserror::Error;

/// Main error type for Xiaoai Teleop
#[derive(Debug, Error)]
pub enum XiaoaiError {
    /// Configuration parse errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration values that parse but are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A `type` name that nothing registered
    #[error("Unknown config type '{name}' (registered: {registered})")]
    UnknownType { name: String, registered: String },

    /// The same `type` name registered twice
    #[error("Config type '{0}' is already registered")]
    DuplicateRegistration(String),

    /// Gamepad errors (open, read, disconnect)
    #[error("Gamepad error: {0}")]
    Gamepad(String),

    /// No usable gamepad was found on the system
    #[error("No gamepad found")]
    GamepadNotFound,

    /// Episode recording errors
    #[error("Recording error: {0}")]
    Recording(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Xiaoai Teleop
pub type Result<T> = std::result::Result<T, XiaoaiError>;
