//! # Debounce Module
//!
//! Per-button debounce driven by edge notifications and a 1 kHz tick.
//!
//! ## Algorithm
//!
//! - An edge only latches a pending flag ([`EdgeLatch::signal`]).
//! - On each tick a pending flag (re)arms a 15-tick window. When the window
//!   runs out, the pin is read once and becomes the stable state.
//! - Every 100 ticks, buttons that are not inside a window are re-read and
//!   forced to the pin level. This recovers from a missed edge.
//!
//! Pins are active-low: an electrically low pin is a pressed button.
//!
//! ## Usage
//!
//! ```
//! use gamepad_link::hal::PinReader;
//! use gamepad_link::input::button::ButtonId;
//! use gamepad_link::input::debounce::{DebounceEngine, EdgeLatch, DEBOUNCE_TICKS};
//!
//! struct AllLow;
//! impl PinReader for AllLow {
//!     fn is_low(&self, _: ButtonId) -> bool { true }
//! }
//!
//! let latch = EdgeLatch::new();
//! let mut engine = DebounceEngine::new();
//! let button = ButtonId::new(0).unwrap();
//!
//! latch.signal(button);
//! for now in 1..=u32::from(DEBOUNCE_TICKS) {
//!     engine.update(now, &latch, &AllLow);
//! }
//! assert!(engine.is_pressed(button));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use super::button::{ButtonId, ButtonSet, ButtonTable, BUTTON_COUNT};
use crate::hal::PinReader;

/// Length of the debounce window in ticks (1 tick = 1 ms).
pub const DEBOUNCE_TICKS: u16 = 15;

/// Ticks between anti-stuck re-polls.
pub const REPOLL_INTERVAL_TICKS: u32 = 100;

/// Pending-edge flags, one per button.
///
/// Written from the edge context with [`signal`](Self::signal), drained from
/// the tick context with [`take`](Self::take). Each flag has one setter and
/// one clearer, so plain atomics are enough.
#[derive(Debug)]
pub struct EdgeLatch {
    pending: [AtomicBool; BUTTON_COUNT],
}

impl Default for EdgeLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeLatch {
    /// Creates a latch with no pending edges.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: [
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
            ],
        }
    }

    /// Records an edge on `button`.
    #[inline]
    pub fn signal(&self, button: ButtonId) {
        self.pending[button.index()].store(true, Ordering::Release);
    }

    /// Records an edge on GPIO line `pin`.
    ///
    /// Returns false if no button is wired to `pin`.
    #[inline]
    pub fn signal_pin(&self, pin: u8) -> bool {
        match ButtonId::from_pin(pin) {
            Some(button) => {
                self.signal(button);
                true
            }
            None => false,
        }
    }

    /// Clears and returns the pending flag of `button`.
    #[inline]
    pub fn take(&self, button: ButtonId) -> bool {
        self.pending[button.index()].swap(false, Ordering::AcqRel)
    }

    /// Returns true if an edge on `button` has not been consumed yet.
    #[must_use]
    pub fn is_pending(&self, button: ButtonId) -> bool {
        self.pending[button.index()].load(Ordering::Acquire)
    }
}

/// Debounce state for all buttons. Owned by the tick context.
#[derive(Debug, Clone)]
pub struct DebounceEngine {
    /// Ticks left in each button's window; 0 = idle.
    remaining: ButtonTable<u16>,
    /// Debounced state, true = pressed.
    stable: ButtonTable<bool>,
    /// Tick count of the last anti-stuck re-poll.
    last_check: u32,
}

impl Default for DebounceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DebounceEngine {
    /// Creates an engine with every button released and idle.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remaining: ButtonTable::filled(0),
            stable: ButtonTable::filled(false),
            last_check: 0,
        }
    }

    /// Advances the engine by one tick.
    ///
    /// `now` is the tick count after increment (wrapping).
    ///
    /// Within a tick, pending edges and window countdowns are handled for
    /// every button before the re-poll runs.
    pub fn update<P: PinReader + ?Sized>(&mut self, now: u32, latch: &EdgeLatch, pins: &P) {
        for button in ButtonId::ALL {
            if latch.take(button) {
                self.remaining[button] = DEBOUNCE_TICKS;
            }

            if self.remaining[button] > 0 {
                self.remaining[button] -= 1;
                if self.remaining[button] == 0 {
                    let pressed = pins.is_low(button);
                    trace!("{} settled: pressed={}", button, pressed);
                    self.stable[button] = pressed;
                }
            }
        }

        if now.wrapping_sub(self.last_check) >= REPOLL_INTERVAL_TICKS {
            self.last_check = now;
            self.repoll(pins);
        }
    }

    /// Forces idle buttons to their current pin level.
    fn repoll<P: PinReader + ?Sized>(&mut self, pins: &P) {
        for button in ButtonId::ALL {
            if self.remaining[button] != 0 {
                continue;
            }
            let pressed = pins.is_low(button);
            if pressed != self.stable[button] {
                trace!("{} corrected by re-poll: pressed={}", button, pressed);
                self.stable[button] = pressed;
            }
        }
    }

    /// Debounced state of `button`.
    #[must_use]
    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.stable[button]
    }

    /// Returns true while `button` is inside a debounce window.
    #[must_use]
    pub fn is_settling(&self, button: ButtonId) -> bool {
        self.remaining[button] > 0
    }

    /// Ticks left in `button`'s window.
    #[must_use]
    pub fn remaining(&self, button: ButtonId) -> u16 {
        self.remaining[button]
    }

    /// Debounced state of all buttons.
    #[must_use]
    pub fn pressed(&self) -> ButtonSet {
        ButtonSet::from(&self.stable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Pin levels as a bit mask; a set bit means the pin is low.
    struct FakePins {
        low: Cell<u8>,
    }

    impl FakePins {
        fn new() -> Self {
            Self { low: Cell::new(0) }
        }

        fn set_low(&self, button: ButtonId, low: bool) {
            let mask = 1u8 << button.index();
            let bits = self.low.get();
            self.low.set(if low { bits | mask } else { bits & !mask });
        }
    }

    impl PinReader for FakePins {
        fn is_low(&self, button: ButtonId) -> bool {
            self.low.get() & (1 << button.index()) != 0
        }
    }

    /// Raises an edge on `target` while `trigger` is being read, like an
    /// interrupt landing in the middle of a tick.
    struct MidTickEdge<'a> {
        pins: &'a FakePins,
        latch: &'a EdgeLatch,
        trigger: ButtonId,
        target: ButtonId,
        fired: Cell<bool>,
    }

    impl PinReader for MidTickEdge<'_> {
        fn is_low(&self, button: ButtonId) -> bool {
            if button == self.trigger && !self.fired.replace(true) {
                self.pins.set_low(self.target, true);
                self.latch.signal(self.target);
            }
            self.pins.is_low(button)
        }
    }

    struct Rig {
        engine: DebounceEngine,
        latch: EdgeLatch,
        pins: FakePins,
        now: u32,
        flips: usize,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                engine: DebounceEngine::new(),
                latch: EdgeLatch::new(),
                pins: FakePins::new(),
                now: 0,
                flips: 0,
            }
        }

        /// Changes a pin level and raises its edge, like a GPIO interrupt.
        fn edge(&mut self, button: ButtonId, low: bool) {
            self.pins.set_low(button, low);
            self.latch.signal(button);
        }

        fn tick(&mut self, button: ButtonId) {
            let before = self.engine.is_pressed(button);
            self.now = self.now.wrapping_add(1);
            self.engine.update(self.now, &self.latch, &self.pins);
            if self.engine.is_pressed(button) != before {
                self.flips += 1;
            }
        }

        fn run(&mut self, button: ButtonId, ticks: u32) {
            for _ in 0..ticks {
                self.tick(button);
            }
        }
    }

    fn b(index: usize) -> ButtonId {
        ButtonId::new(index).unwrap()
    }

    // ==================== EdgeLatch Tests ====================

    #[test]
    fn test_latch_take_clears() {
        let latch = EdgeLatch::new();
        latch.signal(b(3));
        assert!(latch.is_pending(b(3)));
        assert!(latch.take(b(3)));
        assert!(!latch.take(b(3)));
        assert!(!latch.is_pending(b(3)));
    }

    #[test]
    fn test_latch_signal_pin() {
        let latch = EdgeLatch::new();
        assert!(latch.signal_pin(3));
        assert!(latch.is_pending(b(2)));
        assert!(!latch.signal_pin(2));
        assert!(!latch.signal_pin(15));
    }

    // ==================== Debounce Window Tests ====================

    #[test]
    fn test_clean_press_flips_once() {
        let mut rig = Rig::new();
        rig.edge(b(2), true);

        rig.run(b(2), u32::from(DEBOUNCE_TICKS) - 1);
        assert!(!rig.engine.is_pressed(b(2)));
        assert!(rig.engine.is_settling(b(2)));

        rig.tick(b(2));
        assert!(rig.engine.is_pressed(b(2)));
        assert!(!rig.engine.is_settling(b(2)));

        // Hold well past several re-polls
        rig.run(b(2), 500);
        assert!(rig.engine.is_pressed(b(2)));
        assert_eq!(rig.flips, 1);
    }

    #[test]
    fn test_clean_release_flips_once() {
        let mut rig = Rig::new();
        rig.edge(b(0), true);
        rig.run(b(0), 20);
        assert!(rig.engine.is_pressed(b(0)));

        rig.edge(b(0), false);
        rig.run(b(0), 300);
        assert!(!rig.engine.is_pressed(b(0)));
        assert_eq!(rig.flips, 2);
    }

    #[test]
    fn test_bounce_produces_no_flip_until_quiet() {
        let mut rig = Rig::new();

        // Toggle every 3 ticks for 12 ticks, ending low
        for i in 0..4 {
            rig.edge(b(4), i % 2 == 0);
            rig.run(b(4), 3);
            assert_eq!(rig.flips, 0, "no flip while bouncing");
        }
        rig.edge(b(4), true);

        rig.run(b(4), u32::from(DEBOUNCE_TICKS) - 1);
        assert_eq!(rig.flips, 0);

        rig.tick(b(4));
        assert_eq!(rig.flips, 1);
        assert!(rig.engine.is_pressed(b(4)));
    }

    #[test]
    fn test_bounce_back_to_released_produces_no_flip() {
        let mut rig = Rig::new();
        rig.edge(b(1), true);
        rig.run(b(1), 5);
        rig.edge(b(1), false);
        rig.run(b(1), 60);
        assert_eq!(rig.flips, 0);
        assert!(!rig.engine.is_pressed(b(1)));
    }

    #[test]
    fn test_edge_rearms_full_window() {
        let mut rig = Rig::new();
        rig.edge(b(6), true);
        rig.run(b(6), 10);
        assert_eq!(rig.engine.remaining(b(6)), DEBOUNCE_TICKS - 10);

        // Another edge at the same level restarts the window
        rig.latch.signal(b(6));
        rig.tick(b(6));
        assert_eq!(rig.engine.remaining(b(6)), DEBOUNCE_TICKS - 1);

        rig.run(b(6), u32::from(DEBOUNCE_TICKS) - 2);
        assert!(!rig.engine.is_pressed(b(6)));
        rig.tick(b(6));
        assert!(rig.engine.is_pressed(b(6)));
    }

    #[test]
    fn test_channels_are_independent() {
        let mut rig = Rig::new();
        rig.edge(b(0), true);
        rig.run(b(0), 5);
        rig.edge(b(7), true);

        rig.run(b(0), 10);
        assert!(rig.engine.is_pressed(b(0)));
        assert!(!rig.engine.is_pressed(b(7)));
        assert!(rig.engine.is_settling(b(7)));

        rig.run(b(0), 5);
        assert!(rig.engine.is_pressed(b(7)));
        assert_eq!(rig.engine.pressed().bits(), 0b1000_0001);
    }

    // ==================== Re-poll Tests ====================

    #[test]
    fn test_missed_edge_recovered_by_repoll() {
        let mut rig = Rig::new();
        // Pin goes low without an edge notification
        rig.pins.set_low(b(5), true);

        rig.run(b(5), REPOLL_INTERVAL_TICKS - 1);
        assert!(!rig.engine.is_pressed(b(5)));

        rig.tick(b(5));
        assert!(rig.engine.is_pressed(b(5)));
        assert_eq!(rig.flips, 1);
    }

    #[test]
    fn test_missed_release_converges_within_interval() {
        let mut rig = Rig::new();
        rig.edge(b(3), true);
        rig.run(b(3), 40);
        assert!(rig.engine.is_pressed(b(3)));

        // Released without an edge
        rig.pins.set_low(b(3), false);
        rig.run(b(3), REPOLL_INTERVAL_TICKS);
        assert!(!rig.engine.is_pressed(b(3)));
    }

    #[test]
    fn test_repoll_skips_settling_button() {
        let mut rig = Rig::new();
        rig.pins.set_low(b(2), true);
        rig.run(b(2), 94);

        // Edge lands just before the re-poll at tick 100
        rig.latch.signal(b(2));
        rig.run(b(2), 6);
        assert_eq!(rig.now, REPOLL_INTERVAL_TICKS);
        assert!(rig.engine.is_settling(b(2)));
        assert!(!rig.engine.is_pressed(b(2)), "re-poll must not touch a settling button");

        rig.run(b(2), 9);
        assert!(rig.engine.is_pressed(b(2)));
    }

    #[test]
    fn test_edge_after_take_is_forced_by_repoll_then_reresolved() {
        let mut engine = DebounceEngine::new();
        let latch = EdgeLatch::new();
        let pins = FakePins::new();
        let reader = MidTickEdge {
            pins: &pins,
            latch: &latch,
            trigger: b(7),
            target: b(2),
            fired: Cell::new(false),
        };

        // Button 7's window ends on tick 100, the tick of the first re-poll
        let start = REPOLL_INTERVAL_TICKS - u32::from(DEBOUNCE_TICKS) + 1;
        for now in 1..start {
            engine.update(now, &latch, &reader);
        }
        latch.signal(b(7));
        for now in start..=REPOLL_INTERVAL_TICKS {
            engine.update(now, &latch, &reader);
        }

        // Button 2 was already drained this tick, so the re-poll sees its new
        // level first and the edge stays pending
        assert!(reader.fired.get());
        assert!(engine.is_pressed(b(2)));
        assert!(!engine.is_settling(b(2)));
        assert!(latch.is_pending(b(2)));

        // Contact bounces open again; the window opened next tick decides
        pins.set_low(b(2), false);
        let reopened = REPOLL_INTERVAL_TICKS + 1;
        engine.update(reopened, &latch, &reader);
        assert!(engine.is_settling(b(2)));
        assert!(engine.is_pressed(b(2)));

        let settles = reopened + u32::from(DEBOUNCE_TICKS) - 1;
        for now in reopened + 1..settles {
            engine.update(now, &latch, &reader);
        }
        assert!(engine.is_pressed(b(2)));

        engine.update(settles, &latch, &reader);
        assert!(!engine.is_pressed(b(2)));
        assert!(!engine.is_settling(b(2)));
    }

    #[test]
    fn test_repoll_handles_tick_wraparound() {
        let mut rig = Rig::new();
        rig.now = u32::MAX - 10;
        rig.engine.last_check = u32::MAX - 10;
        rig.pins.set_low(b(1), true);

        rig.run(b(1), REPOLL_INTERVAL_TICKS);
        assert!(rig.engine.is_pressed(b(1)));
    }
}
