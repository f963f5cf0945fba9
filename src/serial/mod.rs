//! # Serial Module
//!
//! Carries rendered frames to the host over a serial line.
//!
//! This module handles:
//! - Opening the port as 8N1 without flow control
//! - Falling back to well-known adapter paths when no port is configured
//! - The non-blocking frame queue and the async writer task ([`transport`])

pub mod port_trait;
pub mod transport;

use crate::config::SerialConfig;
use crate::error::{GamepadLinkError, Result};
use port_trait::TokioSerialPort;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};
use tracing::{debug, info, warn};

/// Paths tried, in order, when `[serial] port` is empty
const FALLBACK_PORTS: &[&str] = &[
    "/dev/ttyUSB0", // FTDI / CP210x / CH340 adapters
    "/dev/ttyACM0", // CDC-ACM boards
];

/// Open the port named in `config`, or the first fallback port that opens
///
/// # Errors
///
/// Returns `SerialPortNotFound` listing every path that was tried
///
/// # Examples
///
/// ```no_run
/// use gamepad_link::config::SerialConfig;
/// use gamepad_link::serial;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let port = serial::open(&SerialConfig::default())?;
///     println!("{:?}", port);
///     Ok(())
/// }
/// ```
pub fn open(config: &SerialConfig) -> Result<TokioSerialPort> {
    let configured = [config.port.as_str()];
    let candidates: &[&str] = if config.port.is_empty() {
        FALLBACK_PORTS
    } else {
        &configured
    };
    open_first(candidates, config.baud_rate)
}

/// Try `candidates` in order and return the first port that opens
///
/// Must be called inside a tokio runtime.
pub fn open_first(candidates: &[&str], baud_rate: u32) -> Result<TokioSerialPort> {
    candidates
        .iter()
        .find_map(|&path| match open_8n1(path, baud_rate) {
            Ok(stream) => {
                info!("Frame link on {} ({} baud, 8N1)", path, baud_rate);
                Some(TokioSerialPort::new(stream, path))
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
        .ok_or_else(|| GamepadLinkError::SerialPortNotFound(candidates.join(", ")))
}

fn open_8n1(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
    debug!("Opening {} at {} baud", path, baud_rate);
    tokio_serial::new(path, baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()
        .map_err(|e| GamepadLinkError::Serial(format!("cannot open {}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_order() {
        assert_eq!(FALLBACK_PORTS, &["/dev/ttyUSB0", "/dev/ttyACM0"]);
    }

    #[tokio::test]
    async fn test_open_first_lists_every_candidate() {
        let candidates = &["/dev/gamepad-link-missing-a", "/dev/gamepad-link-missing-b"];
        match open_first(candidates, 115_200) {
            Err(GamepadLinkError::SerialPortNotFound(tried)) => {
                assert_eq!(tried, "/dev/gamepad-link-missing-a, /dev/gamepad-link-missing-b");
            }
            other => panic!("Expected SerialPortNotFound, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_first_with_no_candidates() {
        assert!(matches!(
            open_first(&[], 115_200),
            Err(GamepadLinkError::SerialPortNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_open_8n1_names_the_path() {
        match open_8n1("/dev/gamepad-link-missing", 115_200) {
            Err(GamepadLinkError::Serial(msg)) => {
                assert!(msg.starts_with("cannot open /dev/gamepad-link-missing"));
            }
            other => panic!("Expected Serial error, got: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_configured_port_skips_fallbacks() {
        let config = SerialConfig {
            port: "/dev/gamepad-link-configured".to_string(),
            ..SerialConfig::default()
        };
        match open(&config) {
            Err(GamepadLinkError::SerialPortNotFound(tried)) => {
                assert_eq!(tried, "/dev/gamepad-link-configured");
            }
            other => panic!("Expected SerialPortNotFound, got: {:?}", other),
        }
    }

    // Needs a USB serial adapter
    #[tokio::test]
    #[ignore]
    async fn test_write_frame_with_real_hardware() {
        use crate::packet::encoder::encode_frame;
        use crate::packet::protocol::GamepadFrame;
        use port_trait::SerialPortIO;

        let Ok(mut port) = open(&SerialConfig::default()) else {
            println!("No serial adapter detected (skipping)");
            return;
        };
        let line = encode_frame(&GamepadFrame::default());
        assert!(port.write_frame(&line).await.is_ok());
    }
}
