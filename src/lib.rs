//! # Xiaoai Teleop Library
//!
//! Gamepad teleoperation for the Xiaoai 4-DOF robotic arm.
//!
//! This library provides two plugins for a teleoperation host:
//! - the `xiaoai` follower arm config, registered in [`robot::registry`]
//! - the `xiaoai_gamepad` teleoperator, registered in [`teleop::registry`],
//!   which maps joystick axes to smoothed per-joint deltas

pub mod config;
pub mod error;
pub mod gamepad;
pub mod joint;
pub mod recording;
pub mod registry;
pub mod robot;
pub mod teleop;
