//! # Sampling Pipeline
//!
//! Ties debounce, calibration and frame rendering to the three event sources:
//!
//! | Source | Handler | Owns |
//! |--------|---------|------|
//! | Button edge | [`Shared::on_edge`] | nothing (sets a flag) |
//! | 1 kHz tick | [`TickHandler::on_tick`] | debounce state, pins, sampler, LED |
//! | Conversion complete | [`ConversionHandler::on_conversion_complete`] | scaler, transport |
//!
//! The only state crossing contexts lives in [`Shared`]: the pending-edge
//! latch, the 20-tick button snapshot and the fault latch, all atomics with a
//! single writer each.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use bytes::Bytes;
//! use gamepad_link::error::Result;
//! use gamepad_link::hal::{AnalogSampler, PinReader, RawSamples, Transport};
//! use gamepad_link::input::button::ButtonId;
//! use gamepad_link::input::calibration::calibrate_with_spacing;
//! use gamepad_link::pipeline::{self, Shared};
//!
//! struct Released;
//! impl PinReader for Released {
//!     fn is_low(&self, _: ButtonId) -> bool { false }
//! }
//!
//! struct Centered;
//! impl AnalogSampler for Centered {
//!     fn start_conversion(&mut self) {}
//!     fn acquire(&mut self, _: Duration) -> Result<RawSamples> { Ok([2048; 4]) }
//! }
//!
//! struct Print;
//! impl Transport for Print {
//!     fn send(&mut self, frame: Bytes) -> Result<()> {
//!         print!("{}", String::from_utf8_lossy(&frame));
//!         Ok(())
//!     }
//! }
//!
//! let mut sampler = Centered;
//! let offsets = calibrate_with_spacing(&mut sampler, Duration::ZERO)?;
//!
//! let shared = Arc::new(Shared::new());
//! let (mut tick, mut conversion) =
//!     pipeline::arm(shared, offsets, Released, sampler, (), Print);
//!
//! for _ in 0..20 {
//!     tick.on_tick();
//! }
//! let frame = conversion.on_conversion_complete(&[2048; 4]).unwrap();
//! assert!(!frame.buttons.any_pressed());
//! # Ok::<(), gamepad_link::error::GamepadLinkError>(())
//! ```

pub mod tick;
pub mod conversion;

pub use conversion::{ConversionHandler, FrameStats};
pub use tick::TickHandler;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use crate::hal::{AnalogSampler, PinReader, StatusLed, Transport};
use crate::input::button::{ButtonId, ButtonSet};
use crate::input::calibration::{AxisScaler, ZeroOffsets};
use crate::input::debounce::EdgeLatch;

/// Ticks per frame (50 Hz at a 1 kHz tick).
pub const FRAME_PERIOD_TICKS: u32 = 20;

/// Ticks per heartbeat LED toggle.
pub const HEARTBEAT_PERIOD_TICKS: u32 = 1000;

/// State shared between the edge, tick and conversion contexts.
#[derive(Debug, Default)]
pub struct Shared {
    latch: EdgeLatch,
    /// Written by the tick context only.
    buttons: AtomicU8,
    halted: AtomicBool,
}

impl Shared {
    /// Creates shared state with no pending edges and no buttons pressed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latch: EdgeLatch::new(),
            buttons: AtomicU8::new(0),
            halted: AtomicBool::new(false),
        }
    }

    /// Edge handler for `button`. O(1); only latches a flag.
    #[inline]
    pub fn on_edge(&self, button: ButtonId) {
        if !self.is_halted() {
            self.latch.signal(button);
        }
    }

    /// Edge handler keyed by GPIO line. Lines without a button are ignored.
    #[inline]
    pub fn on_pin_edge(&self, pin: u8) {
        if !self.is_halted() {
            self.latch.signal_pin(pin);
        }
    }

    /// Enters the terminal fault state. Every handler becomes a no-op.
    pub fn halt(&self) {
        if !self.halted.swap(true, Ordering::AcqRel) {
            error!("Fatal fault: sampling pipeline halted");
        }
    }

    /// Returns true once [`halt`](Self::halt) has been called.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Buttons as of the most recent 20-tick snapshot.
    #[must_use]
    pub fn buttons(&self) -> ButtonSet {
        ButtonSet::from_bits(self.buttons.load(Ordering::Acquire))
    }

    pub(crate) fn latch(&self) -> &EdgeLatch {
        &self.latch
    }

    /// Must complete before the conversion it belongs to is started.
    fn publish_buttons(&self, buttons: ButtonSet) {
        self.buttons.store(buttons.bits(), Ordering::Release);
    }
}

/// Builds the tick and conversion handlers from a completed calibration.
///
/// Requiring [`ZeroOffsets`] means the handlers cannot exist before the
/// blocking calibration has finished.
pub fn arm<P, S, L, T>(
    shared: Arc<Shared>,
    offsets: ZeroOffsets,
    pins: P,
    sampler: S,
    led: L,
    transport: T,
) -> (TickHandler<P, S, L>, ConversionHandler<T>)
where
    P: PinReader,
    S: AnalogSampler,
    L: StatusLed,
    T: Transport,
{
    info!("Arming sampling pipeline (offsets {:?})", offsets.as_array());
    let tick = TickHandler::new(Arc::clone(&shared), pins, sampler, led);
    let conversion = ConversionHandler::new(shared, AxisScaler::new(offsets), transport);
    (tick, conversion)
}
