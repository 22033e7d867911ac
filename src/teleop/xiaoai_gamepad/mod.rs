//! # Xiaoai Gamepad Teleoperator
//!
//! Maps gamepad sticks directly to joint deltas for the Xiaoai 4-DOF arm.
//!
//! ## Controls
//!
//! | Input | Effect |
//! |-------|--------|
//! | Left Stick X | base_yaw |
//! | Left Stick Y | base_pitch |
//! | Right Stick X | elbow_pitch |
//! | Right Stick Y | wrist_pitch |
//! | Y / Triangle | End episode with success |
//! | A / Cross | End episode with failure |
//! | X / Square | Re-record episode |
//! | RB / R1 | Intervention (held) |
//! | RT / LT | Gripper open/close (if enabled) |
//!
//! Stick assignments follow the configured [`JointMapping`].
//!
//! ## Per-tick Pipeline
//!
//! For each joint: normalized axis → deadzone → scale by `joint_step_size`
//! → exponential smoothing → scale by `joint_step_size` again. The step size
//! therefore enters the relative target twice.
//!
//! [`JointMapping`]: crate::joint::JointMapping

mod config;

pub use config::XiaoaiGamepadConfig;

use std::collections::BTreeMap;
use tracing::{debug, info};

use super::smoothing::ExponentialSmoother;
use super::{Action, ActionFeatures, Feedback, TeleopEvents, Teleoperator};
use crate::error::Result;
use crate::gamepad::deadzone::apply_deadzone;
use crate::gamepad::state::{GamepadState, AXIS_TRIGGER_LEFT, AXIS_TRIGGER_RIGHT};
use crate::gamepad::{EvdevGamepad, GamepadSource};
use crate::joint::Joint;

/// Action key of the optional gripper channel.
pub const GRIPPER_ACTION_KEY: &str = "gripper.pos";

/// Gamepad teleoperator for the Xiaoai arm.
pub struct XiaoaiGamepadTeleop {
    config: XiaoaiGamepadConfig,
    gamepad: Option<Box<dyn GamepadSource>>,
    smoother: ExponentialSmoother,
}

impl std::fmt::Debug for XiaoaiGamepadTeleop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XiaoaiGamepadTeleop")
            .field("config", &self.config)
            .field("connected", &self.gamepad.is_some())
            .field("smoother", &self.smoother)
            .finish()
    }
}

impl XiaoaiGamepadTeleop {
    /// Creates a disconnected teleoperator.
    #[must_use]
    pub fn new(config: XiaoaiGamepadConfig) -> Self {
        let smoother = ExponentialSmoother::new(config.smoothing_factor);
        Self {
            config,
            gamepad: None,
            smoother,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &XiaoaiGamepadConfig {
        &self.config
    }

    /// Connects using an already-built gamepad source.
    ///
    /// [`Teleoperator::connect`] calls this with an [`EvdevGamepad`].
    ///
    /// # Errors
    ///
    /// Returns whatever the source's `start` returns. The teleoperator stays
    /// disconnected in that case.
    pub fn connect_with(&mut self, mut gamepad: Box<dyn GamepadSource>) -> Result<()> {
        if self.gamepad.is_some() {
            self.disconnect();
        }

        gamepad.start()?;
        self.smoother.reset();
        self.gamepad = Some(gamepad);

        self.log_controls();
        Ok(())
    }

    fn log_controls(&self) {
        let mapping = &self.config.joint_mapping;
        info!("Xiaoai Gamepad Controls:");
        for (joint, axis) in mapping.iter() {
            info!("  Axis {}: {}", axis, joint);
        }
        info!("  Y/Triangle: End episode with SUCCESS");
        info!("  A/Cross: End episode with FAILURE");
        info!("  X/Square: Rerecord episode");
        info!("  RB: Intervention mode");
        if self.config.use_gripper {
            info!("  RT/LT: Gripper control");
        }
    }

    /// Stick deflection for `joint` after the deadzone (-1.0 to 1.0).
    fn joint_input(&self, state: &GamepadState, joint: Joint) -> f32 {
        let axis = self.config.joint_mapping.axis_for(joint);
        apply_deadzone(state.axis(axis), self.config.deadzone)
    }

    /// Gripper delta from the triggers: RT opens, LT closes.
    fn gripper_delta(&self, state: &GamepadState) -> f32 {
        let open = apply_deadzone(state.trigger(AXIS_TRIGGER_RIGHT), self.config.deadzone);
        let close = apply_deadzone(state.trigger(AXIS_TRIGGER_LEFT), self.config.deadzone);
        (open - close) * self.config.joint_step_size
    }

    /// The action returned while disconnected: every channel at 0.0.
    fn idle_action(&self) -> Action {
        let mut action = Action::uniform(0.0);
        if self.config.use_gripper {
            action.insert(GRIPPER_ACTION_KEY, 0.0);
        }
        action
    }
}

impl Teleoperator for XiaoaiGamepadTeleop {
    fn name(&self) -> &'static str {
        XiaoaiGamepadConfig::TYPE
    }

    fn action_features(&self) -> ActionFeatures {
        let mut names: Vec<&str> = Joint::ALL.iter().map(|joint| joint.name()).collect();
        if self.config.use_gripper {
            names.push("gripper");
        }
        ActionFeatures::joints(names)
    }

    fn feedback_features(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn connect(&mut self) -> Result<()> {
        let gamepad = EvdevGamepad::new(&self.config.gamepad_device);
        self.connect_with(Box::new(gamepad))
    }

    fn is_connected(&self) -> bool {
        self.gamepad
            .as_ref()
            .map(|gamepad| gamepad.is_running())
            .unwrap_or(false)
    }

    fn calibrate(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_calibrated(&self) -> bool {
        true
    }

    fn configure(&mut self) -> Result<()> {
        Ok(())
    }

    fn get_action(&mut self) -> Action {
        let state = match &self.gamepad {
            Some(gamepad) => gamepad.snapshot(),
            None => return self.idle_action(),
        };

        let mut action = Action::new();
        for joint in Joint::ALL {
            let delta = self.joint_input(&state, joint) * self.config.joint_step_size;
            let filtered = self.smoother.update(joint, delta);
            action.insert(joint.action_key(), filtered * self.config.joint_step_size);
        }

        if self.config.use_gripper {
            action.insert(GRIPPER_ACTION_KEY, self.gripper_delta(&state));
        }

        action
    }

    fn get_teleop_events(&mut self) -> TeleopEvents {
        let gamepad = match self.gamepad.as_mut() {
            Some(gamepad) => gamepad,
            None => return TeleopEvents::default(),
        };

        let is_intervention = gamepad.snapshot().intervention();
        let status = gamepad.take_episode_end_status();
        if let Some(status) = status {
            info!("Episode end requested: {:?}", status);
        }

        TeleopEvents::from_status(is_intervention, status)
    }

    fn send_feedback(&mut self, feedback: &Feedback) -> Result<()> {
        debug!(
            "Ignoring {} feedback values (gamepad has no feedback channels)",
            feedback.len()
        );
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(mut gamepad) = self.gamepad.take() {
            gamepad.stop();
            self.smoother.reset();
            info!("Xiaoai gamepad disconnected");
        }
    }
}

impl Drop for XiaoaiGamepadTeleop {
    fn drop(&mut self) {
        self.disconnect();
    }
}
