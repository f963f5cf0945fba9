//! # Bench Gamepad
//!
//! Finds and opens the evdev device whose buttons and sticks stand in for
//! the board inputs.
//!
//! A device qualifies when it reports `BTN_SOUTH` and `ABS_X`, which any
//! common USB or Bluetooth gamepad does.

use evdev::{AbsoluteAxisType, Device, InputEvent, Key};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::mapper::{BUTTON_KEYS, CHANNEL_AXES};
use super::InitialState;
use crate::config::InputConfig;
use crate::error::{GamepadLinkError, Result};

/// Directory scanned for `event*` nodes
const INPUT_DIR: &str = "/dev/input";

/// An open evdev gamepad
pub struct BenchGamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for BenchGamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchGamepad")
            .field("device_path", &self.device_path)
            .field("name", &self.device.name())
            .finish()
    }
}

impl BenchGamepad {
    /// Open the configured device, or the first gamepad found
    ///
    /// # Errors
    ///
    /// - `InputDevice`: the configured path cannot be opened or is not a gamepad
    /// - `InputDeviceNotFound`: auto-detection found nothing usable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gamepad_link::board::gamepad::BenchGamepad;
    /// use gamepad_link::config::InputConfig;
    ///
    /// let gamepad = BenchGamepad::open(&InputConfig::default())?;
    /// println!("Using {}", gamepad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &InputConfig) -> Result<Self> {
        if config.device_path.is_empty() {
            Self::discover(Path::new(INPUT_DIR))
        } else {
            Self::open_path(Path::new(&config.device_path))
        }
    }

    /// Open a specific `/dev/input/eventX` node
    pub fn open_path(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|e| {
            GamepadLinkError::InputDevice(format!("Failed to open {}: {}", path.display(), e))
        })?;

        if !looks_like_gamepad(&device) {
            return Err(GamepadLinkError::InputDevice(format!(
                "{} does not report BTN_SOUTH and ABS_X",
                path.display()
            )));
        }

        let device_path = path.to_string_lossy().to_string();
        info!(
            "Opened gamepad {} at {}",
            device.name().unwrap_or("<unnamed>"),
            device_path
        );
        Ok(Self {
            device,
            device_path,
        })
    }

    /// Scan `dir` for the first `event*` node that looks like a gamepad
    pub fn discover(dir: &Path) -> Result<Self> {
        for path in event_nodes(dir)? {
            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("<unnamed>")
                    );

                    if looks_like_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found gamepad at: {}", device_path);
                        return Ok(Self {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    // Usually permission denied; keep looking
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(GamepadLinkError::InputDeviceNotFound)
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Read held keys, axis ranges and axis positions straight from the
    /// kernel
    ///
    /// Axes the device lacks, or reports with an empty range, stay at
    /// mid-scale with an 8-bit range.
    ///
    /// # Errors
    ///
    /// Returns `InputDevice` if either state query fails
    pub fn initial_state(&self) -> Result<InitialState> {
        let keys = self.device.get_key_state().map_err(|e| {
            GamepadLinkError::InputDevice(format!("Failed to read key state: {}", e))
        })?;
        let abs = self.device.get_abs_state().map_err(|e| {
            GamepadLinkError::InputDevice(format!("Failed to read axis state: {}", e))
        })?;
        let supported = self.device.supported_absolute_axes();

        let mut state = InitialState::default();
        for (held, &key) in state.pressed.iter_mut().zip(BUTTON_KEYS.iter()) {
            *held = keys.contains(key);
        }
        for (channel, &axis) in CHANNEL_AXES.iter().enumerate() {
            if !supported.map_or(false, |axes| axes.contains(axis)) {
                warn!("{} has no {:?}, channel {} stays centred", self.device_path, axis, channel);
                continue;
            }
            let info = &abs[usize::from(axis.0)];
            if !state.set_axis(channel, info.minimum, info.maximum, info.value) {
                warn!(
                    "{} reports an empty range for {:?} ({}..={})",
                    self.device_path, axis, info.minimum, info.maximum
                );
            }
        }
        Ok(state)
    }

    /// Fetch pending events, blocking until at least one arrives
    ///
    /// # Errors
    ///
    /// Returns `InputDevice` if the read fails (e.g., device unplugged)
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| GamepadLinkError::InputDevice(format!("Failed to fetch events: {}", e)))
    }
}

fn looks_like_gamepad(device: &Device) -> bool {
    let has_button = device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
    let has_stick = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));
    has_button && has_stick
}

/// `event*` entries of `dir`, sorted so selection is deterministic
fn event_nodes(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(GamepadLinkError::InputDevice(format!(
            "{} directory not found",
            dir.display()
        )));
    }

    let mut nodes: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with("event"))
        })
        .collect();
    nodes.sort();
    Ok(nodes)
}
