//! # Conversion Handler
//!
//! Work done when an analog conversion completes: scale the axes, combine
//! them with the latest button snapshot, render the frame and hand it to the
//! transport.

use std::sync::Arc;

use bytes::BytesMut;
use tracing::debug;

use super::Shared;
use crate::hal::{RawSamples, Transport, AXIS_CHANNELS};
use crate::input::calibration::AxisScaler;
use crate::packet::encoder::encode_frame_into;
use crate::packet::protocol::{GamepadFrame, FRAME_MAX_LEN};

/// Frame hand-off counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames accepted by the transport
    pub sent: u64,
    /// Frames the transport refused
    pub dropped: u64,
}

/// State owned by the conversion-complete context.
pub struct ConversionHandler<T> {
    shared: Arc<Shared>,
    scaler: AxisScaler,
    transport: T,
    buf: BytesMut,
    last_raw: RawSamples,
    latest: GamepadFrame,
    stats: FrameStats,
}

impl<T> std::fmt::Debug for ConversionHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionHandler")
            .field("scaler", &self.scaler)
            .field("latest", &self.latest)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ConversionHandler<T> {
    pub(super) fn new(shared: Arc<Shared>, scaler: AxisScaler, transport: T) -> Self {
        Self {
            shared,
            scaler,
            transport,
            buf: BytesMut::with_capacity(FRAME_MAX_LEN),
            last_raw: [0; AXIS_CHANNELS],
            latest: GamepadFrame::default(),
            stats: FrameStats::default(),
        }
    }

    /// Handles a completed conversion.
    ///
    /// Returns the frame that was rendered, or `None` once halted. A frame the
    /// transport refuses is counted as dropped and not retried; the next
    /// conversion supersedes it.
    ///
    /// Never starts a conversion itself.
    pub fn on_conversion_complete(&mut self, raw: &RawSamples) -> Option<GamepadFrame> {
        if self.shared.is_halted() {
            return None;
        }

        self.last_raw = *raw;
        let axes = self.scaler.scale(raw);
        let frame = GamepadFrame::new(self.shared.buttons(), axes);
        self.latest = frame;

        self.buf.reserve(FRAME_MAX_LEN);
        encode_frame_into(&frame, &mut self.buf);
        let line = self.buf.split().freeze();

        match self.transport.send(line) {
            Ok(()) => self.stats.sent += 1,
            Err(e) => {
                self.stats.dropped += 1;
                debug!("Frame dropped: {}", e);
            }
        }

        Some(frame)
    }

    /// The most recently rendered frame.
    #[must_use]
    pub fn latest(&self) -> &GamepadFrame {
        &self.latest
    }

    /// Raw samples of the most recent conversion.
    #[must_use]
    pub fn last_raw(&self) -> &RawSamples {
        &self.last_raw
    }

    /// Hand-off counters.
    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}
