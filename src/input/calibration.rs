//! # Calibration Module
//!
//! Zero-offset calibration and scaling of the analog stick channels.
//!
//! ## Zero Offset
//!
//! At startup, with the sticks untouched, 20 conversions of all channels are
//! averaged. The average becomes each channel's logical zero. Nothing checks
//! that the sticks really were centered; a stick held during startup stays
//! miscalibrated until the next power cycle.
//!
//! ## Scaling
//!
//! Each raw sample is turned into a value of roughly -100..=100:
//!
//! `scaled = (raw - zero_offset) * 100 / 2048` (integer, truncated toward zero)
//!
//! The four channels are then routed to the stick axes through a fixed
//! table (some inverted), and any value with magnitude below 7 becomes 0.
//! Results are not clamped: a reading far outside the calibrated span may
//! land slightly beyond ±100.
//!
//! ## Axis Assignments
//!
//! | Axis | ADC channel | Inverted |
//! |------|-------------|----------|
//! | Left Y | 2 | no |
//! | Left X | 3 | yes |
//! | Right Y | 0 | yes |
//! | Right X | 1 | no |
//!
//! ## Usage
//!
//! ```
//! use gamepad_link::input::calibration::{AxisScaler, CalibrationAccumulator};
//!
//! let mut acc = CalibrationAccumulator::new();
//! acc.add(&[2048, 2048, 2048, 2048]);
//! let scaler = AxisScaler::new(acc.finish().unwrap());
//!
//! let axes = scaler.scale(&[2048 + 500, 2048, 2048, 2048]);
//! assert_eq!(axes.right_y, -24);
//! ```

use std::time::Duration;

use tracing::{debug, info};

use crate::error::{GamepadLinkError, Result};
use crate::hal::{AnalogSampler, RawSamples, AXIS_CHANNELS};
use crate::packet::protocol::AxisValues;

/// Number of conversions averaged during calibration.
pub const CALIBRATION_SAMPLES: u32 = 20;

/// Settling time between calibration conversions.
pub const CALIBRATION_SPACING: Duration = Duration::from_millis(10);

/// Full-scale output magnitude.
pub const AXIS_SCALE: i32 = 100;

/// Raw counts corresponding to full-scale output (half of the 12-bit span).
pub const AXIS_HALF_SPAN: i32 = 2048;

/// Scaled values with a smaller magnitude than this are reported as 0.
pub const DEAD_ZONE: i32 = 7;

/// Where an output axis takes its sample from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSource {
    /// ADC channel index.
    pub channel: usize,
    /// Negate the scaled value.
    pub inverted: bool,
}

/// Sources of `left_y`, `left_x`, `right_y`, `right_x`, in that order.
pub const AXIS_SOURCES: [AxisSource; AXIS_CHANNELS] = [
    AxisSource { channel: 2, inverted: false },
    AxisSource { channel: 3, inverted: true },
    AxisSource { channel: 0, inverted: true },
    AxisSource { channel: 1, inverted: false },
];

/// Per-channel centre readings established at startup.
///
/// Only produced by a completed calibration, so holding one proves the
/// calibration phase has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroOffsets([u16; AXIS_CHANNELS]);

impl ZeroOffsets {
    /// Offset of ADC channel `channel`.
    #[must_use]
    pub fn channel(&self, channel: usize) -> u16 {
        self.0[channel]
    }

    /// All offsets in ADC channel order.
    #[must_use]
    pub fn as_array(&self) -> [u16; AXIS_CHANNELS] {
        self.0
    }
}

/// Running per-channel sums collected during calibration.
#[derive(Debug, Clone, Default)]
pub struct CalibrationAccumulator {
    sample_count: u32,
    sum: [u32; AXIS_CHANNELS],
}

impl CalibrationAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one conversion result.
    pub fn add(&mut self, samples: &RawSamples) {
        for (sum, &sample) in self.sum.iter_mut().zip(samples.iter()) {
            *sum += u32::from(sample);
        }
        self.sample_count += 1;
    }

    /// Number of conversions added so far.
    #[must_use]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Computes the mean of each channel.
    ///
    /// Returns `None` if no samples were added.
    #[must_use]
    pub fn finish(self) -> Option<ZeroOffsets> {
        if self.sample_count == 0 {
            return None;
        }
        let count = self.sample_count;
        // Mean of u16 samples always fits in u16
        Some(ZeroOffsets(self.sum.map(|sum| (sum / count) as u16)))
    }
}

/// Runs the startup calibration with the standard spacing.
///
/// Blocks for roughly `CALIBRATION_SAMPLES * CALIBRATION_SPACING`.
///
/// # Errors
///
/// Returns `Calibration` if any acquisition fails.
pub fn calibrate<S: AnalogSampler + ?Sized>(sampler: &mut S) -> Result<ZeroOffsets> {
    calibrate_with_spacing(sampler, CALIBRATION_SPACING)
}

/// Runs the startup calibration with a custom settling time per conversion.
///
/// # Errors
///
/// Returns `Calibration` if any acquisition fails.
pub fn calibrate_with_spacing<S: AnalogSampler + ?Sized>(
    sampler: &mut S,
    spacing: Duration,
) -> Result<ZeroOffsets> {
    info!(
        "Calibrating stick centres ({} samples, {:?} apart); keep the sticks untouched",
        CALIBRATION_SAMPLES, spacing
    );

    let mut acc = CalibrationAccumulator::new();
    for n in 1..=CALIBRATION_SAMPLES {
        let samples = sampler.acquire(spacing).map_err(|e| {
            GamepadLinkError::Calibration(format!(
                "sample {} of {}: {}",
                n, CALIBRATION_SAMPLES, e
            ))
        })?;
        debug!("Calibration sample {}: {:?}", n, samples);
        acc.add(&samples);
    }

    let offsets = acc
        .finish()
        .ok_or_else(|| GamepadLinkError::Calibration("no samples collected".to_string()))?;
    info!("Calibration complete, zero offsets: {:?}", offsets.as_array());
    Ok(offsets)
}

/// Scales a raw sample against its zero offset, before the dead zone.
///
/// # Examples
///
/// ```
/// use gamepad_link::input::calibration::scale_channel;
///
/// assert_eq!(scale_channel(2548, 2048), 24);
/// assert_eq!(scale_channel(1548, 2048), -24);
/// ```
#[must_use]
pub fn scale_channel(raw: u16, offset: u16) -> i32 {
    (i32::from(raw) - i32::from(offset)) * AXIS_SCALE / AXIS_HALF_SPAN
}

/// Forces values inside the dead zone to 0.
///
/// # Examples
///
/// ```
/// use gamepad_link::input::calibration::apply_dead_zone;
///
/// assert_eq!(apply_dead_zone(6), 0);
/// assert_eq!(apply_dead_zone(-6), 0);
/// assert_eq!(apply_dead_zone(7), 7);
/// ```
#[must_use]
pub fn apply_dead_zone(value: i32) -> i16 {
    if value.abs() < DEAD_ZONE {
        0
    } else {
        // |value| <= 65535 * 100 / 2048, well inside i16
        value as i16
    }
}

/// Converts raw conversion results to stick axes. Owned by the
/// conversion context.
#[derive(Debug, Clone)]
pub struct AxisScaler {
    offsets: ZeroOffsets,
}

impl AxisScaler {
    /// Creates a scaler from completed calibration offsets.
    #[must_use]
    pub fn new(offsets: ZeroOffsets) -> Self {
        Self { offsets }
    }

    /// Scales, routes and dead-zones one set of raw samples.
    #[must_use]
    pub fn scale(&self, raw: &RawSamples) -> AxisValues {
        let [left_y, left_x, right_y, right_x] = AXIS_SOURCES.map(|source| {
            let scaled = scale_channel(raw[source.channel], self.offsets.channel(source.channel));
            apply_dead_zone(if source.inverted { -scaled } else { scaled })
        });

        AxisValues {
            left_y,
            left_x,
            right_y,
            right_x,
        }
    }
}
