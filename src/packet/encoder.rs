//! # Frame Encoder
//!
//! Renders a [`GamepadFrame`] into its text line.

use bytes::{BufMut, Bytes, BytesMut};

use super::protocol::*;
use crate::input::button::ButtonId;

/// Encode a frame into a standalone buffer
///
/// # Arguments
///
/// * `frame` - Buttons and axes to render
///
/// # Returns
///
/// * `Bytes` - Complete frame including the trailing `\n`
///
/// # Examples
///
/// ```
/// use gamepad_link::packet::encoder::encode_frame;
/// use gamepad_link::packet::protocol::GamepadFrame;
///
/// let line = encode_frame(&GamepadFrame::default());
/// assert_eq!(&line[..], b"B:00000000,A:0,0,0,0\n");
/// ```
pub fn encode_frame(frame: &GamepadFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_MAX_LEN);
    encode_frame_into(frame, &mut buf);
    buf.freeze()
}

/// Append a rendered frame to `buf`
///
/// Appends at most [`FRAME_MAX_LEN`] bytes. Callers reusing one buffer
/// across frames should `reserve(FRAME_MAX_LEN)` and `split()` after each
/// call so earlier frames stay untouched.
///
/// # Layout
///
/// ```text
/// B:  b0 b1 b2 b3 b4 b5 b6 b7  ,A:  ly , lx , ry , rx  \n
/// ```
pub fn encode_frame_into(frame: &GamepadFrame, buf: &mut BytesMut) {
    buf.put_slice(FRAME_BUTTONS_PREFIX.as_bytes());
    for id in ButtonId::ALL {
        buf.put_u8(if frame.buttons.is_pressed(id) { b'1' } else { b'0' });
    }

    buf.put_slice(FRAME_AXES_PREFIX.as_bytes());
    for (i, value) in frame.axes.to_array().into_iter().enumerate() {
        if i > 0 {
            buf.put_u8(FRAME_AXIS_SEPARATOR);
        }
        put_decimal(buf, value);
    }

    buf.put_u8(FRAME_TERMINATOR);
}

/// Write a signed decimal without leading zeros
fn put_decimal(buf: &mut BytesMut, value: i16) {
    if value < 0 {
        buf.put_u8(b'-');
    }

    let mut n = value.unsigned_abs();
    let mut digits = [0u8; 5];
    let mut start = digits.len();
    loop {
        start -= 1;
        digits[start] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    buf.put_slice(&digits[start..]);
}
