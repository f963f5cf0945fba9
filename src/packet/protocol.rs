//! # Frame Protocol Constants and Types
//!
//! Core definitions for the text frame sent once per sampling period:
//!
//! ```text
//! B:bbbbbbbb,A:ly,lx,ry,rx\n
//! ```

use crate::input::button::{ButtonId, ButtonSet, BUTTON_COUNT};

/// Prefix of the button field
pub const FRAME_BUTTONS_PREFIX: &str = "B:";

/// Separator between the button field and the axis field
pub const FRAME_AXES_PREFIX: &str = ",A:";

/// Separator between axis values
pub const FRAME_AXIS_SEPARATOR: u8 = b',';

/// Frame terminator
pub const FRAME_TERMINATOR: u8 = b'\n';

/// Number of axis values in a frame
pub const FRAME_AXIS_COUNT: usize = 4;

/// Longest possible frame:
/// "B:" (2) + 8 digits + ",A:" (3) + 4 × "-32768" (24) + 3 commas + '\n'
pub const FRAME_MAX_LEN: usize = 2 + BUTTON_COUNT + 3 + FRAME_AXIS_COUNT * 6 + 3 + 1;

/// Scaled stick positions, roughly -100..=100 each, 0 at centre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisValues {
    /// Left stick vertical
    pub left_y: i16,
    /// Left stick horizontal
    pub left_x: i16,
    /// Right stick vertical
    pub right_y: i16,
    /// Right stick horizontal
    pub right_x: i16,
}

impl AxisValues {
    /// Both sticks at rest.
    pub const CENTERED: AxisValues = AxisValues {
        left_y: 0,
        left_x: 0,
        right_y: 0,
        right_x: 0,
    };

    /// Values in frame order: `ly, lx, ry, rx`.
    #[must_use]
    pub fn to_array(self) -> [i16; FRAME_AXIS_COUNT] {
        [self.left_y, self.left_x, self.right_y, self.right_x]
    }

    /// Builds values from frame order: `ly, lx, ry, rx`.
    #[must_use]
    pub fn from_array([left_y, left_x, right_y, right_x]: [i16; FRAME_AXIS_COUNT]) -> Self {
        Self {
            left_y,
            left_x,
            right_y,
            right_x,
        }
    }
}

/// One complete button + axis snapshot.
///
/// # Examples
///
/// ```
/// use gamepad_link::packet::protocol::GamepadFrame;
///
/// let frame = GamepadFrame::default();
/// assert!(!frame.buttons.any_pressed());
/// assert_eq!(frame.axes.left_y, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GamepadFrame {
    /// Debounced buttons from the last 20-tick snapshot
    pub buttons: ButtonSet,
    /// Axes computed from the conversion that produced this frame
    pub axes: AxisValues,
}

impl GamepadFrame {
    /// Creates a frame.
    #[must_use]
    pub fn new(buttons: ButtonSet, axes: AxisValues) -> Self {
        Self { buttons, axes }
    }

    /// Returns true if `button` is pressed in this frame.
    #[must_use]
    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.buttons.is_pressed(button)
    }

    /// Button field as it appears on the wire, e.g. `"00100000"`.
    #[must_use]
    pub fn button_digits(&self) -> String {
        ButtonId::ALL
            .iter()
            .map(|&id| if self.buttons.is_pressed(id) { '1' } else { '0' })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_max_len() {
        let worst = "B:11111111,A:-32768,-32768,-32768,-32768\n";
        assert_eq!(FRAME_MAX_LEN, worst.len());
        assert_eq!(FRAME_MAX_LEN, 41);
    }

    #[test]
    fn test_axis_array_order() {
        let axes = AxisValues { left_y: 1, left_x: 2, right_y: 3, right_x: 4 };
        assert_eq!(axes.to_array(), [1, 2, 3, 4]);
        assert_eq!(AxisValues::from_array([1, 2, 3, 4]), axes);
    }

    #[test]
    fn test_button_digits_order() {
        let mut buttons = ButtonSet::EMPTY;
        buttons.set(ButtonId::new(2).unwrap(), true);
        buttons.set(ButtonId::new(7).unwrap(), true);

        let frame = GamepadFrame::new(buttons, AxisValues::CENTERED);
        assert_eq!(frame.button_digits(), "00100001");
        assert!(frame.is_pressed(ButtonId::new(2).unwrap()));
    }
}
