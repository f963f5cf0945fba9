//! # Bench Board Module
//!
//! Runs the sampling pipeline on a Linux host with an evdev gamepad standing
//! in for the GPIO bank and the ADC.
//!
//! This module handles:
//! - Holding the simulated pin levels and ADC channel values ([`BoardLevels`])
//! - Seeding those levels from the device state read at start-up ([`InitialState`])
//! - Implementing the pipeline collaborators over those levels
//! - Finding and opening the gamepad ([`gamepad`])
//! - Translating evdev events into levels and edges ([`mapper`])
//! - Running the blocking reader thread ([`spawn_reader`])
//!
//! Buttons are active-low as on the board: a pressed key drives its pin low.

pub mod gamepad;
pub mod mapper;

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{GamepadLinkError, Result};
use crate::hal::{AnalogSampler, PinReader, RawSamples, StatusLed, AXIS_CHANNELS};
use crate::input::button::{ButtonId, BUTTON_COUNT};
use crate::pipeline::Shared;
use gamepad::BenchGamepad;
use mapper::{AxisRange, LevelMapper};

/// Channel value at rest (12-bit mid-scale)
pub const ADC_MIDSCALE: u16 = 2048;

/// Largest 12-bit conversion result
pub const ADC_MAX: u16 = 4095;

/// Pin levels and channel values written by the reader thread.
#[derive(Debug)]
pub struct BoardLevels {
    low: [AtomicBool; BUTTON_COUNT],
    channels: [AtomicU16; AXIS_CHANNELS],
    connected: AtomicBool,
}

impl Default for BoardLevels {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardLevels {
    /// All pins high (released), all channels at mid-scale.
    #[must_use]
    pub fn new() -> Self {
        Self {
            low: std::array::from_fn(|_| AtomicBool::new(false)),
            channels: std::array::from_fn(|_| AtomicU16::new(ADC_MIDSCALE)),
            connected: AtomicBool::new(true),
        }
    }

    /// Drives the pin for `button`. Returns true if the level changed.
    pub fn set_low(&self, button: ButtonId, low: bool) -> bool {
        self.low[button.index()].swap(low, Ordering::AcqRel) != low
    }

    #[must_use]
    pub fn is_low(&self, button: ButtonId) -> bool {
        self.low[button.index()].load(Ordering::Acquire)
    }

    /// Sets an ADC channel, clamped to 12 bits. Out-of-range channels are ignored.
    pub fn set_channel(&self, channel: usize, value: u16) {
        if let Some(slot) = self.channels.get(channel) {
            slot.store(value.min(ADC_MAX), Ordering::Release);
        }
    }

    /// Current value of every channel, in channel order.
    #[must_use]
    pub fn sample(&self) -> RawSamples {
        std::array::from_fn(|ch| self.channels[ch].load(Ordering::Acquire))
    }

    /// Loads every pin level and channel value from `state` without
    /// raising edges.
    pub fn seed(&self, state: &InitialState) {
        for id in ButtonId::ALL {
            self.low[id.index()].store(state.pressed[id.index()], Ordering::Release);
        }
        for (channel, &value) in state.channels.iter().enumerate() {
            self.set_channel(channel, value);
        }
    }

    /// Marks the input device as gone.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Device state read once, before the reader thread starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialState {
    /// Reported range of each channel's axis, in channel order
    pub ranges: [AxisRange; AXIS_CHANNELS],
    /// Current axis positions, already stretched to 12 bits
    pub channels: RawSamples,
    /// Keys held down, in button order
    pub pressed: [bool; BUTTON_COUNT],
}

impl Default for InitialState {
    /// Nothing pressed, sticks at mid-scale, 8-bit ranges.
    fn default() -> Self {
        Self {
            ranges: [AxisRange::UNSIGNED_8BIT; AXIS_CHANNELS],
            channels: [ADC_MIDSCALE; AXIS_CHANNELS],
            pressed: [false; BUTTON_COUNT],
        }
    }
}

impl InitialState {
    /// Records the range and position the device reports for `channel`.
    ///
    /// Returns false, leaving the channel at its defaults, when the range is
    /// empty or the channel does not exist.
    pub fn set_axis(&mut self, channel: usize, min: i32, max: i32, value: i32) -> bool {
        match (AxisRange::new(min, max), channel < AXIS_CHANNELS) {
            (Some(range), true) => {
                self.ranges[channel] = range;
                self.channels[channel] = range.to_adc(value);
                true
            }
            _ => false,
        }
    }
}

/// [`PinReader`] over [`BoardLevels`]
#[derive(Debug, Clone)]
pub struct SimPins {
    levels: Arc<BoardLevels>,
}

impl SimPins {
    pub fn new(levels: Arc<BoardLevels>) -> Self {
        Self { levels }
    }
}

impl PinReader for SimPins {
    fn is_low(&self, button: ButtonId) -> bool {
        self.levels.is_low(button)
    }
}

/// [`AnalogSampler`] over [`BoardLevels`].
///
/// A started conversion completes immediately: the sample is pushed onto the
/// completion channel and the owner of the receiver forwards it to the
/// conversion handler.
#[derive(Debug)]
pub struct SimAdc {
    levels: Arc<BoardLevels>,
    complete: mpsc::UnboundedSender<RawSamples>,
}

impl SimAdc {
    /// Creates the sampler and the receiving end of its completion channel.
    pub fn new(levels: Arc<BoardLevels>) -> (Self, mpsc::UnboundedReceiver<RawSamples>) {
        let (complete, rx) = mpsc::unbounded_channel();
        (Self { levels, complete }, rx)
    }
}

impl AnalogSampler for SimAdc {
    fn start_conversion(&mut self) {
        if self.complete.send(self.levels.sample()).is_err() {
            debug!("Conversion completed with no receiver");
        }
    }

    fn acquire(&mut self, spacing: Duration) -> Result<RawSamples> {
        thread::sleep(spacing);
        if !self.levels.is_connected() {
            return Err(GamepadLinkError::InputDevice(
                "input device disconnected".to_string(),
            ));
        }
        Ok(self.levels.sample())
    }
}

/// Heartbeat that logs instead of lighting an LED
#[derive(Debug, Default)]
pub struct TracingLed {
    lit: bool,
}

impl TracingLed {
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl StatusLed for TracingLed {
    fn toggle(&mut self) {
        self.lit = !self.lit;
        debug!("Heartbeat LED {}", if self.lit { "on" } else { "off" });
    }
}

/// Seeds `levels` from the gamepad and starts the blocking evdev reader
/// thread.
///
/// Seeding happens before the thread starts, so calibration sees the real
/// stick positions and a key held at start-up is already low. The thread
/// runs until the device fails, at which point the levels are marked
/// disconnected and the pipeline is halted.
///
/// # Errors
///
/// - `InputDevice`: the initial device state cannot be read
/// - `Io`: the thread cannot be spawned
pub fn spawn_reader(
    mut gamepad: BenchGamepad,
    levels: Arc<BoardLevels>,
    shared: Arc<Shared>,
) -> Result<thread::JoinHandle<()>> {
    let initial = gamepad.initial_state()?;
    levels.seed(&initial);
    debug!("Seeded levels {:?} from {}", initial, gamepad.device_path());

    let handle = thread::Builder::new()
        .name("evdev-reader".to_string())
        .spawn(move || {
            let mut mapper =
                LevelMapper::new(Arc::clone(&levels), Arc::clone(&shared), initial.ranges);
            info!(
                "Reading input from {} ({})",
                gamepad.device_path(),
                gamepad.name().unwrap_or("<unnamed>")
            );

            loop {
                match gamepad.fetch_events() {
                    Ok(events) => {
                        for event in events {
                            mapper.process_event(&event);
                        }
                    }
                    Err(e) => {
                        error!("Input device failed: {}", e);
                        levels.disconnect();
                        shared.halt();
                        break;
                    }
                }
            }
        })?;
    Ok(handle)
}
