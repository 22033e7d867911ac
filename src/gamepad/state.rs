//! # Gamepad State Module
//!
//! Folds raw evdev events from a gamepad into a [`GamepadState`] snapshot.
//!
//! ## Axis Codes (EV_ABS)
//!
//! Axes are stored by their raw `ABS_*` code so a [`JointMapping`] can refer
//! to any of them. For an Xbox-style pad:
//!
//! | Code | evdev Name | Input |
//! |------|------------|-------|
//! | 0 | ABS_X | Left Stick X |
//! | 1 | ABS_Y | Left Stick Y |
//! | 2 | ABS_Z | LT |
//! | 3 | ABS_RX | Right Stick X |
//! | 4 | ABS_RY | Right Stick Y |
//! | 5 | ABS_RZ | RT |
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code | Function |
//! |--------|------------|----------|
//! | Y / Triangle | BTN_NORTH | End episode with success |
//! | A / Cross | BTN_SOUTH | End episode with failure |
//! | X / Square | BTN_WEST | Re-record episode |
//! | RB / R1 | BTN_TR | Intervention (held) |
//!
//! [`JointMapping`]: crate::joint::JointMapping

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key};
use std::collections::BTreeMap;

use crate::teleop::EpisodeEndStatus;

/// Left trigger axis code (ABS_Z).
pub const AXIS_TRIGGER_LEFT: u16 = 2;
/// Right trigger axis code (ABS_RZ).
pub const AXIS_TRIGGER_RIGHT: u16 = 5;

/// Raw range of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl Default for AxisRange {
    /// Signed 16-bit range used by xpad and most USB pads.
    fn default() -> Self {
        Self {
            min: -32768,
            max: 32767,
        }
    }
}

impl AxisRange {
    /// Creates a range. `min` and `max` are swapped if given in reverse.
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Maps a raw value to -1.0..=1.0 with the range midpoint at 0.0.
    #[must_use]
    pub fn normalize(&self, raw: i32) -> f32 {
        let half = (self.max as f32 - self.min as f32) / 2.0;
        if half <= 0.0 {
            return 0.0;
        }
        let center = (self.max as f32 + self.min as f32) / 2.0;
        ((raw as f32 - center) / half).clamp(-1.0, 1.0)
    }

    /// Maps a raw value to 0.0..=1.0 with `min` at 0.0.
    #[must_use]
    pub fn normalize_unipolar(&self, raw: i32) -> f32 {
        let span = self.max as f32 - self.min as f32;
        if span <= 0.0 {
            return 0.0;
        }
        ((raw as f32 - self.min as f32) / span).clamp(0.0, 1.0)
    }
}

/// Snapshot of the gamepad inputs the teleoperator cares about.
///
/// # Examples
///
/// ```
/// use xiaoai_teleop::gamepad::state::GamepadState;
///
/// let state = GamepadState::default();
/// assert_eq!(state.axis(0), 0.0);   // Unseen axes read as centered
/// assert!(!state.btn_tr);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadState {
    /// Last raw value per axis code.
    axes: BTreeMap<u16, i32>,
    /// Raw range per axis code. Missing entries use [`AxisRange::default`].
    ranges: BTreeMap<u16, AxisRange>,

    /// Y / Triangle.
    pub btn_north: bool,
    /// A / Cross.
    pub btn_south: bool,
    /// X / Square.
    pub btn_west: bool,
    /// B / Circle.
    pub btn_east: bool,
    /// LB / L1.
    pub btn_tl: bool,
    /// RB / R1.
    pub btn_tr: bool,
}

impl GamepadState {
    /// Records the raw range of an axis, as reported by the device.
    pub fn set_axis_range(&mut self, axis: u16, range: AxisRange) {
        self.ranges.insert(axis, range);
    }

    /// Returns the raw range of an axis.
    #[must_use]
    pub fn axis_range(&self, axis: u16) -> AxisRange {
        self.ranges.get(&axis).copied().unwrap_or_default()
    }

    /// Stores a raw axis value.
    pub fn set_raw_axis(&mut self, axis: u16, value: i32) {
        self.axes.insert(axis, value);
    }

    /// Returns the last raw value of an axis, if one was seen.
    #[must_use]
    pub fn raw_axis(&self, axis: u16) -> Option<i32> {
        self.axes.get(&axis).copied()
    }

    /// Returns a stick axis normalized to -1.0..=1.0 (0.0 if never seen).
    #[must_use]
    pub fn axis(&self, axis: u16) -> f32 {
        self.raw_axis(axis)
            .map(|raw| self.axis_range(axis).normalize(raw))
            .unwrap_or(0.0)
    }

    /// Returns a trigger axis normalized to 0.0..=1.0 (0.0 if never seen).
    #[must_use]
    pub fn trigger(&self, axis: u16) -> f32 {
        self.raw_axis(axis)
            .map(|raw| self.axis_range(axis).normalize_unipolar(raw))
            .unwrap_or(0.0)
    }

    /// Whether the intervention button (RB) is held.
    #[must_use]
    pub fn intervention(&self) -> bool {
        self.btn_tr
    }
}

/// Parses raw evdev events, maintains a [`GamepadState`] and latches
/// episode-end button presses until they are read.
///
/// # Examples
///
/// ```
/// use evdev::{EventType, InputEvent, Key};
/// use xiaoai_teleop::gamepad::state::GamepadEventMapper;
/// use xiaoai_teleop::teleop::EpisodeEndStatus;
///
/// let mut mapper = GamepadEventMapper::new();
/// mapper.process_event(&InputEvent::new(EventType::KEY, Key::BTN_NORTH.code(), 1));
/// assert_eq!(mapper.take_episode_end_status(), Some(EpisodeEndStatus::Success));
/// assert_eq!(mapper.take_episode_end_status(), None);
/// ```
#[derive(Debug, Default)]
pub struct GamepadEventMapper {
    state: GamepadState,
    episode_end_status: Option<EpisodeEndStatus>,
}

impl GamepadEventMapper {
    /// Creates a mapper with nothing pressed and no axis seen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper seeded with device-reported axis ranges.
    #[must_use]
    pub fn with_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (u16, AxisRange)>,
    {
        let mut mapper = Self::new();
        for (axis, range) in ranges {
            mapper.state.set_axis_range(axis, range);
        }
        mapper
    }

    /// Returns a reference to the current state.
    #[must_use]
    pub fn state(&self) -> &GamepadState {
        &self.state
    }

    /// Returns a clone of the current state.
    #[must_use]
    pub fn state_snapshot(&self) -> GamepadState {
        self.state.clone()
    }

    /// Returns and clears the latched episode-end status.
    pub fn take_episode_end_status(&mut self) -> Option<EpisodeEndStatus> {
        self.episode_end_status.take()
    }

    /// Processes a single evdev input event.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            InputEventKind::Key(key) => self.process_key_event(key, event.value()),
            _ => {
                // Ignore sync events and other event types
            }
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        self.state.set_raw_axis(axis.0, value);
    }

    /// `value` is 1 on press, 0 on release and 2 on autorepeat.
    fn process_key_event(&mut self, key: Key, value: i32) {
        let pressed = value != 0;

        let slot = match key {
            Key::BTN_NORTH => &mut self.state.btn_north,
            Key::BTN_SOUTH => &mut self.state.btn_south,
            Key::BTN_WEST => &mut self.state.btn_west,
            Key::BTN_EAST => &mut self.state.btn_east,
            Key::BTN_TL => &mut self.state.btn_tl,
            Key::BTN_TR => &mut self.state.btn_tr,
            _ => return,
        };
        *slot = pressed;

        if value != 1 {
            return;
        }
        let status = match key {
            Key::BTN_NORTH => EpisodeEndStatus::Success,
            Key::BTN_SOUTH => EpisodeEndStatus::Failure,
            Key::BTN_WEST => EpisodeEndStatus::Rerecord,
            _ => return,
        };
        self.episode_end_status = Some(status);
    }

    /// Resets all state (ranges are kept).
    pub fn reset(&mut self) {
        let ranges = std::mem::take(&mut self.state.ranges);
        self.state = GamepadState {
            ranges,
            ..GamepadState::default()
        };
        self.episode_end_status = None;
    }
}
