//! # Frame Decoder
//!
//! Parses frame lines back into [`GamepadFrame`]s on the receiving side.

use super::protocol::*;
use crate::error::{GamepadLinkError, Result};
use crate::input::button::{ButtonId, ButtonSet, BUTTON_COUNT};

/// Decode one frame line
///
/// # Arguments
///
/// * `line` - Frame bytes; the trailing `\n` is optional
///
/// # Returns
///
/// * `Result<GamepadFrame>` - Decoded frame, or error if malformed
///
/// # Errors
///
/// Returns `Frame` error if:
/// - The line is not UTF-8 or lacks the `B:` / `,A:` markers
/// - The button field is not exactly eight `0`/`1` digits
/// - There are not exactly four axis values
/// - An axis value has a `+` sign, leading zeros, is `-0`, or does not fit `i16`
///
/// # Examples
///
/// ```
/// use gamepad_link::packet::decoder::decode_frame;
///
/// let frame = decode_frame(b"B:00100000,A:0,0,-24,0\n")?;
/// assert_eq!(frame.axes.right_y, -24);
/// # Ok::<(), gamepad_link::error::GamepadLinkError>(())
/// ```
pub fn decode_frame(line: &[u8]) -> Result<GamepadFrame> {
    let line = line.strip_suffix(&[FRAME_TERMINATOR]).unwrap_or(line);

    let text = std::str::from_utf8(line)
        .map_err(|_| GamepadLinkError::Frame("Frame is not valid UTF-8".to_string()))?;

    let rest = text.strip_prefix(FRAME_BUTTONS_PREFIX).ok_or_else(|| {
        GamepadLinkError::Frame(format!("Missing '{}' prefix", FRAME_BUTTONS_PREFIX))
    })?;

    let (digits, axes) = rest.split_once(FRAME_AXES_PREFIX).ok_or_else(|| {
        GamepadLinkError::Frame(format!("Missing '{}' separator", FRAME_AXES_PREFIX))
    })?;

    let buttons = decode_buttons(digits)?;

    let fields: Vec<&str> = axes.split(FRAME_AXIS_SEPARATOR as char).collect();
    if fields.len() != FRAME_AXIS_COUNT {
        return Err(GamepadLinkError::Frame(format!(
            "Expected {} axis values, got {}",
            FRAME_AXIS_COUNT,
            fields.len()
        )));
    }

    let mut values = [0i16; FRAME_AXIS_COUNT];
    for (value, field) in values.iter_mut().zip(fields) {
        *value = decode_axis(field)?;
    }

    Ok(GamepadFrame::new(buttons, AxisValues::from_array(values)))
}

/// Decode the eight-digit button field
fn decode_buttons(digits: &str) -> Result<ButtonSet> {
    if digits.len() != BUTTON_COUNT {
        return Err(GamepadLinkError::Frame(format!(
            "Button field must have {} digits, got {}",
            BUTTON_COUNT,
            digits.len()
        )));
    }

    let mut buttons = ButtonSet::EMPTY;
    for (id, digit) in ButtonId::ALL.into_iter().zip(digits.bytes()) {
        match digit {
            b'0' => {}
            b'1' => buttons.set(id, true),
            other => {
                return Err(GamepadLinkError::Frame(format!(
                    "Invalid button digit: 0x{:02X}",
                    other
                )))
            }
        }
    }
    Ok(buttons)
}

/// Decode one signed axis value in canonical form
fn decode_axis(field: &str) -> Result<i16> {
    let negative = field.starts_with('-');
    let digits = if negative { &field[1..] } else { field };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GamepadLinkError::Frame(format!("Invalid axis value: {:?}", field)));
    }

    if digits.len() > 1 && digits.starts_with('0') {
        return Err(GamepadLinkError::Frame(format!("Leading zero in axis value: {:?}", field)));
    }

    if negative && digits == "0" {
        return Err(GamepadLinkError::Frame("Negative zero axis value".to_string()));
    }

    field
        .parse::<i16>()
        .map_err(|_| GamepadLinkError::Frame(format!("Axis value out of range: {:?}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::encoder::encode_frame;

    fn assert_frame_error(line: &[u8]) {
        match decode_frame(line) {
            Err(GamepadLinkError::Frame(_)) => {}
            other => panic!("Expected Frame error for {:?}, got: {:?}", line, other),
        }
    }

    #[test]
    fn test_decode_idle_frame() {
        let frame = decode_frame(b"B:00000000,A:0,0,0,0\n").unwrap();
        assert_eq!(frame, GamepadFrame::default());
    }

    #[test]
    fn test_decode_without_terminator() {
        let frame = decode_frame(b"B:10000001,A:12,-7,0,100").unwrap();
        assert_eq!(frame.buttons.bits(), 0b1000_0001);
        assert_eq!(frame.axes, AxisValues { left_y: 12, left_x: -7, right_y: 0, right_x: 100 });
    }

    #[test]
    fn test_decode_matches_encoder() {
        let mut buttons = ButtonSet::EMPTY;
        buttons.set(ButtonId::new(2).unwrap(), true);
        let frame = GamepadFrame::new(buttons, AxisValues::from_array([-100, 99, -24, 7]));
        assert_eq!(decode_frame(&encode_frame(&frame)).unwrap(), frame);
    }

    #[test]
    fn test_decode_rejects_bad_prefix() {
        assert_frame_error(b"b:00000000,A:0,0,0,0\n");
        assert_frame_error(b"00000000,A:0,0,0,0\n");
        assert_frame_error(b"B:00000000,a:0,0,0,0\n");
    }

    #[test]
    fn test_decode_rejects_bad_buttons() {
        assert_frame_error(b"B:0000000,A:0,0,0,0\n");
        assert_frame_error(b"B:000000000,A:0,0,0,0\n");
        assert_frame_error(b"B:00002000,A:0,0,0,0\n");
    }

    #[test]
    fn test_decode_rejects_wrong_axis_count() {
        assert_frame_error(b"B:00000000,A:0,0,0\n");
        assert_frame_error(b"B:00000000,A:0,0,0,0,0\n");
        assert_frame_error(b"B:00000000,A:\n");
    }

    #[test]
    fn test_decode_rejects_non_canonical_numbers() {
        assert_frame_error(b"B:00000000,A:+5,0,0,0\n");
        assert_frame_error(b"B:00000000,A:05,0,0,0\n");
        assert_frame_error(b"B:00000000,A:-0,0,0,0\n");
        assert_frame_error(b"B:00000000,A:-,0,0,0\n");
        assert_frame_error(b"B:00000000,A:1 ,0,0,0\n");
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        assert_frame_error(b"B:00000000,A:32768,0,0,0\n");
        assert!(decode_frame(b"B:00000000,A:-32768,0,0,0\n").is_ok());
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert_frame_error(b"B:\xFF\xFE000000,A:0,0,0,0\n");
    }
}
