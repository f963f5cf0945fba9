//! # Event Mapper
//!
//! Turns evdev events from the bench gamepad into board pin levels and ADC
//! channel values.
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code | GPIO line |
//! |--------|------------|-----------|
//! | 0 | BTN_SOUTH | 0 |
//! | 1 | BTN_EAST | 1 |
//! | 2 | BTN_WEST | 3 |
//! | 3 | BTN_NORTH | 4 |
//! | 4 | BTN_TL | 5 |
//! | 5 | BTN_TR | 6 |
//! | 6 | BTN_SELECT | 7 |
//! | 7 | BTN_START | 8 |
//!
//! ## Axis Codes (EV_ABS)
//!
//! | evdev Code | ADC channel | Frame field |
//! |------------|-------------|-------------|
//! | ABS_RZ | 0 | ry (inverted) |
//! | ABS_Z | 1 | rx |
//! | ABS_Y | 2 | ly |
//! | ABS_X | 3 | lx (inverted) |
//!
//! Each axis is stretched from the range the device reports for it
//! (`0..=255` on DualSense, `-32768..=32767` on Xbox-style pads) to the
//! 12-bit ADC range.

use std::sync::Arc;

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key};
use tracing::trace;

use super::{BoardLevels, ADC_MAX};
use crate::hal::AXIS_CHANNELS;
use crate::input::button::{ButtonId, BUTTON_COUNT};
use crate::pipeline::Shared;

/// evdev key driving each button, in button order.
pub const BUTTON_KEYS: [Key; BUTTON_COUNT] = [
    Key::BTN_SOUTH,
    Key::BTN_EAST,
    Key::BTN_WEST,
    Key::BTN_NORTH,
    Key::BTN_TL,
    Key::BTN_TR,
    Key::BTN_SELECT,
    Key::BTN_START,
];

/// Button driven by `key`, if any.
#[must_use]
pub fn button_for_key(key: Key) -> Option<ButtonId> {
    BUTTON_KEYS
        .iter()
        .position(|&k| k == key)
        .and_then(ButtonId::new)
}

/// evdev axis driving each ADC channel, in channel order.
pub const CHANNEL_AXES: [AbsoluteAxisType; AXIS_CHANNELS] = [
    AbsoluteAxisType::ABS_RZ,
    AbsoluteAxisType::ABS_Z,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_X,
];

/// ADC channel driven by `axis`, if any.
#[must_use]
pub fn channel_for_axis(axis: AbsoluteAxisType) -> Option<usize> {
    CHANNEL_AXES.iter().position(|&a| a == axis)
}

/// Value range a device reports for one stick axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    min: i32,
    max: i32,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self::UNSIGNED_8BIT
    }
}

impl AxisRange {
    /// Assumed when a device reports no usable range.
    pub const UNSIGNED_8BIT: Self = Self { min: 0, max: 255 };

    /// Range `min..=max`, or `None` if it is empty or a single value.
    #[must_use]
    pub fn new(min: i32, max: i32) -> Option<Self> {
        (max > min).then_some(Self { min, max })
    }

    /// Stretches `value` to 0-4095, clamping it to the range first.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_link::board::mapper::AxisRange;
    ///
    /// let signed = AxisRange::new(-32768, 32767).unwrap();
    /// assert_eq!(signed.to_adc(-32768), 0);
    /// assert_eq!(signed.to_adc(0), 2047);
    /// assert_eq!(signed.to_adc(32767), 4095);
    /// assert_eq!(AxisRange::UNSIGNED_8BIT.to_adc(300), 4095);
    /// ```
    #[must_use]
    pub fn to_adc(self, value: i32) -> u16 {
        let span = i64::from(self.max) - i64::from(self.min);
        let offset = i64::from(value.clamp(self.min, self.max)) - i64::from(self.min);
        // offset <= span, so the quotient is at most ADC_MAX
        (offset * i64::from(ADC_MAX) / span) as u16
    }
}

/// Applies evdev events to [`BoardLevels`], raising pin edges on
/// [`Shared`] whenever a button level changes.
#[derive(Debug)]
pub struct LevelMapper {
    levels: Arc<BoardLevels>,
    shared: Arc<Shared>,
    ranges: [AxisRange; AXIS_CHANNELS],
}

impl LevelMapper {
    /// `ranges` gives the device's range for each channel, in channel order.
    pub fn new(
        levels: Arc<BoardLevels>,
        shared: Arc<Shared>,
        ranges: [AxisRange; AXIS_CHANNELS],
    ) -> Self {
        Self {
            levels,
            shared,
            ranges,
        }
    }

    /// Processes a single evdev input event.
    ///
    /// Key auto-repeat (value 2) keeps the key pressed and raises no edge.
    /// Sync and unrelated events are ignored.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            InputEventKind::Key(key) => self.process_key_event(key, event.value() != 0),
            InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            _ => {}
        }
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        let Some(button) = button_for_key(key) else {
            return;
        };
        if self.levels.set_low(button, pressed) {
            trace!("{} {}", button, if pressed { "pressed" } else { "released" });
            self.shared.on_pin_edge(button.pin());
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        if let Some(channel) = channel_for_axis(axis) {
            self.levels
                .set_channel(channel, self.ranges[channel].to_adc(value));
        }
    }
}
