//! # Board Collaborators
//!
//! Traits the pipeline uses to reach the hardware. Pin modes, ADC channel
//! setup, DMA and UART configuration happen before these are handed over.

use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;
use crate::input::button::ButtonId;

/// Number of analog channels sampled per conversion.
pub const AXIS_CHANNELS: usize = 4;

/// One raw conversion result per analog channel, in ADC channel order.
pub type RawSamples = [u16; AXIS_CHANNELS];

/// Instantaneous digital pin levels.
#[cfg_attr(test, mockall::automock)]
pub trait PinReader {
    /// Returns true if the pin wired to `button` is electrically low.
    fn is_low(&self, button: ButtonId) -> bool;
}

/// Multi-channel analog acquisition.
#[cfg_attr(test, mockall::automock)]
pub trait AnalogSampler {
    /// Starts an asynchronous conversion of all channels.
    ///
    /// Completion is delivered by calling
    /// [`ConversionHandler::on_conversion_complete`](crate::pipeline::ConversionHandler::on_conversion_complete)
    /// with the results.
    fn start_conversion(&mut self);

    /// Performs one conversion and blocks until it completes.
    ///
    /// `spacing` is the settling time the sampler waits before converting.
    /// Only used during startup calibration.
    fn acquire(&mut self, spacing: Duration) -> Result<RawSamples>;
}

/// Outbound byte link. Sending must not block.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Queues `frame` for transmission.
    ///
    /// An error means the frame was not accepted and is lost.
    fn send(&mut self, frame: Bytes) -> Result<()>;
}

/// Heartbeat indicator.
#[cfg_attr(test, mockall::automock)]
pub trait StatusLed {
    fn toggle(&mut self);
}

impl StatusLed for () {
    fn toggle(&mut self) {}
}
