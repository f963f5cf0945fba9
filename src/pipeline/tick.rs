//! # Tick Handler
//!
//! Work done on every 1 kHz tick: debounce, the 20-tick button snapshot and
//! conversion trigger, and the heartbeat.

use std::sync::Arc;

use tracing::trace;

use super::{Shared, FRAME_PERIOD_TICKS, HEARTBEAT_PERIOD_TICKS};
use crate::hal::{AnalogSampler, PinReader, StatusLed};
use crate::input::debounce::DebounceEngine;

/// State owned by the tick context.
pub struct TickHandler<P, S, L> {
    shared: Arc<Shared>,
    engine: DebounceEngine,
    pins: P,
    sampler: S,
    led: L,
    /// Ticks since arming (wrapping).
    ticks: u32,
    conversions_started: u64,
}

impl<P, S, L> std::fmt::Debug for TickHandler<P, S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickHandler")
            .field("ticks", &self.ticks)
            .field("conversions_started", &self.conversions_started)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<P, S, L> TickHandler<P, S, L>
where
    P: PinReader,
    S: AnalogSampler,
    L: StatusLed,
{
    pub(super) fn new(shared: Arc<Shared>, pins: P, sampler: S, led: L) -> Self {
        Self {
            shared,
            engine: DebounceEngine::new(),
            pins,
            sampler,
            led,
            ticks: 0,
            conversions_started: 0,
        }
    }

    /// Handles one 1 kHz tick.
    ///
    /// Every [`FRAME_PERIOD_TICKS`] ticks the debounced buttons are published
    /// to the shared snapshot and then a conversion is started, so the frame
    /// built from that conversion sees exactly this snapshot.
    pub fn on_tick(&mut self) {
        if self.shared.is_halted() {
            return;
        }

        self.ticks = self.ticks.wrapping_add(1);
        self.engine.update(self.ticks, self.shared.latch(), &self.pins);

        if self.ticks % FRAME_PERIOD_TICKS == 0 {
            self.shared.publish_buttons(self.engine.pressed());
            self.sampler.start_conversion();
            self.conversions_started += 1;
        }

        if self.ticks % HEARTBEAT_PERIOD_TICKS == 0 {
            trace!("Heartbeat at tick {}", self.ticks);
            self.led.toggle();
        }
    }

    /// Ticks handled since arming.
    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Conversions started since arming.
    #[must_use]
    pub fn conversions_started(&self) -> u64 {
        self.conversions_started
    }

    /// The debounce state.
    #[must_use]
    pub fn debounce(&self) -> &DebounceEngine {
        &self.engine
    }
}
