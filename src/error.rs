//! # Error Types
//!
//! Custom error types for Gamepad Link using `thiserror`.

use thiserror::Error;

/// Main error type for Gamepad Link
#[derive(Debug, Error)]
pub enum GamepadLinkError {
    /// Malformed frame text
    #[error("Frame error: {0}")]
    Frame(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame log serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial ports could be opened
    #[error("No serial port found (tried: {0})")]
    SerialPortNotFound(String),

    /// The transport still holds earlier frames
    #[error("Transport busy, frame dropped")]
    TransportBusy,

    /// The transport's consumer has gone away
    #[error("Transport closed")]
    TransportClosed,

    /// Input device errors
    #[error("Input device error: {0}")]
    InputDevice(String),

    /// No usable input device was found
    #[error("No gamepad input device found")]
    InputDeviceNotFound,

    /// Startup calibration could not acquire samples
    #[error("Calibration failed: {0}")]
    Calibration(String),

    /// The fault latch is set; the pipeline is permanently stopped
    #[error("Pipeline halted")]
    Halted,
}

/// Result type alias for Gamepad Link
pub type Result<T> = std::result::Result<T, GamepadLinkError>;
