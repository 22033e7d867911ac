//! # Teleoperation Module
//!
//! The teleoperator lifecycle and the types that flow through it.
//!
//! A host drives every teleoperator the same way:
//!
//! 1. `connect()` then `calibrate()` / `configure()`
//! 2. each control tick: `get_action()` and `get_teleop_events()`
//! 3. `disconnect()`
//!
//! Teleoperator configs are looked up by their `type` name through
//! [`registry()`].

pub mod smoothing;
pub mod xiaoai_gamepad;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::joint::Joint;
use crate::registry::ConfigRegistry;

pub use xiaoai_gamepad::{XiaoaiGamepadConfig, XiaoaiGamepadTeleop};

/// Feedback sent back to a teleoperator (name → value).
pub type Feedback = BTreeMap<String, f32>;

/// Ordered set of named action values, e.g. `base_yaw.pos → 1.5`.
///
/// Serializes as a JSON/TOML map in insertion order.
///
/// # Examples
///
/// ```
/// use xiaoai_teleop::teleop::Action;
///
/// let mut action = Action::new();
/// action.insert("base_yaw.pos", 1.5);
/// action.insert("base_yaw.pos", 2.0);
/// assert_eq!(action.get("base_yaw.pos"), Some(2.0));
/// assert_eq!(action.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
    entries: Vec<(String, f32)>,
}

impl Action {
    /// Creates an empty action.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an action with every joint at `value`.
    #[must_use]
    pub fn uniform(value: f32) -> Self {
        Joint::ALL
            .into_iter()
            .map(|joint| (joint.action_key(), value))
            .collect()
    }

    /// Sets `key` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: f32) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f32> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// Returns the value for `joint` (`<joint>.pos`).
    #[must_use]
    pub fn joint(&self, joint: Joint) -> Option<f32> {
        self.get(&joint.action_key())
    }

    /// Mutable access to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut f32> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, f32)> for Action {
    fn from_iter<I: IntoIterator<Item = (String, f32)>>(iter: I) -> Self {
        let mut action = Action::new();
        for (key, value) in iter {
            action.insert(key, value);
        }
        action
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// How the operator ended the current episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeEndStatus {
    Success,
    Failure,
    Rerecord,
}

/// Per-tick teleoperation events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeleopEvents {
    /// The operator is taking over from the policy.
    pub is_intervention: bool,
    /// The current episode should stop.
    pub terminate_episode: bool,
    /// The episode ended successfully.
    pub success: bool,
    /// The episode should be discarded and recorded again.
    pub rerecord_episode: bool,
}

impl TeleopEvents {
    /// Derives the event flags from the intervention button and an
    /// episode-end status.
    ///
    /// # Examples
    ///
    /// ```
    /// use xiaoai_teleop::teleop::{EpisodeEndStatus, TeleopEvents};
    ///
    /// let events = TeleopEvents::from_status(false, Some(EpisodeEndStatus::Rerecord));
    /// assert!(events.terminate_episode);
    /// assert!(events.rerecord_episode);
    /// assert!(!events.success);
    /// ```
    #[must_use]
    pub fn from_status(is_intervention: bool, status: Option<EpisodeEndStatus>) -> Self {
        Self {
            is_intervention,
            terminate_episode: matches!(
                status,
                Some(EpisodeEndStatus::Rerecord | EpisodeEndStatus::Failure)
            ),
            success: status == Some(EpisodeEndStatus::Success),
            rerecord_episode: status == Some(EpisodeEndStatus::Rerecord),
        }
    }
}

/// Shape description of the actions a teleoperator produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFeatures {
    pub dtype: &'static str,
    pub shape: Vec<usize>,
    pub names: BTreeMap<String, Vec<String>>,
}

impl ActionFeatures {
    /// `float32` features over the named joints, grouped under `"joints"`.
    #[must_use]
    pub fn joints<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        Self {
            dtype: "float32",
            shape: vec![names.len()],
            names: BTreeMap::from([("joints".to_string(), names)]),
        }
    }
}

/// A device that turns operator input into robot actions.
pub trait Teleoperator: Send {
    /// Registered name of this teleoperator.
    fn name(&self) -> &'static str;

    /// Shape of the actions returned by [`Teleoperator::get_action`].
    fn action_features(&self) -> ActionFeatures;

    /// Feedback channels accepted by [`Teleoperator::send_feedback`] (name → dtype).
    fn feedback_features(&self) -> BTreeMap<String, String>;

    /// Opens the input device.
    fn connect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    fn calibrate(&mut self) -> Result<()>;

    fn is_calibrated(&self) -> bool;

    fn configure(&mut self) -> Result<()>;

    /// Reads the current action. Must be cheap enough to call every tick.
    fn get_action(&mut self) -> Action;

    /// Reads intervention and episode-end events.
    fn get_teleop_events(&mut self) -> TeleopEvents;

    fn send_feedback(&mut self, feedback: &Feedback) -> Result<()>;

    /// Releases the input device. No-op when not connected.
    fn disconnect(&mut self);
}

/// Configs of every registered teleoperator.
#[derive(Debug, Clone, PartialEq)]
pub enum TeleoperatorConfig {
    XiaoaiGamepad(XiaoaiGamepadConfig),
}

impl TeleoperatorConfig {
    /// Registered `type` name of this config.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            TeleoperatorConfig::XiaoaiGamepad(_) => XiaoaiGamepadConfig::TYPE,
        }
    }

    /// Validates the inner config.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        match self {
            TeleoperatorConfig::XiaoaiGamepad(config) => config.validate(),
        }
    }
}

/// Returns the teleoperator config registry with every built-in type registered.
///
/// # Errors
///
/// Returns `DuplicateRegistration` if two built-ins share a name.
pub fn registry() -> Result<ConfigRegistry<TeleoperatorConfig>> {
    let mut registry = ConfigRegistry::new();
    registry.register_subclass(XiaoaiGamepadConfig::TYPE, |value| {
        XiaoaiGamepadConfig::from_toml(value).map(TeleoperatorConfig::XiaoaiGamepad)
    })?;
    Ok(registry)
}

/// Builds the teleoperator for `config`.
#[must_use]
pub fn make_teleoperator(config: TeleoperatorConfig) -> Box<dyn Teleoperator> {
    match config {
        TeleoperatorConfig::XiaoaiGamepad(config) => Box::new(XiaoaiGamepadTeleop::new(config)),
    }
}
