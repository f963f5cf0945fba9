//! # Configuration Module
//!
//! Bench configuration loaded from TOML.
//!
//! Only the host side is configurable: serial port, input device, frame log
//! and diagnostics. Scan rate, debounce window, dead zone and the button/axis
//! layout are fixed.
//!
//! Every key is optional. Unknown keys are rejected so a misspelt setting
//! fails loudly instead of silently taking its default.
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//!
//! [frame_log]
//! enabled = true
//! sample_every = 50
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::path::Path;

use crate::error::{GamepadLinkError, Result};

/// Baud rates accepted for the frame link.
pub const SUPPORTED_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

/// Level names accepted in `[logging] level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 100;
pub const MAX_WRITE_TIMEOUT_MS: u64 = 10_000;

pub const DEFAULT_FRAME_LOG_DIR: &str = "./logs";
pub const DEFAULT_RECORDS_PER_FILE: usize = 10_000;
pub const DEFAULT_FILES_TO_KEEP: usize = 10;
/// One record per second at 50 frames per second.
pub const DEFAULT_SAMPLE_EVERY: u64 = 50;
/// One record per minute.
pub const MAX_SAMPLE_EVERY: u64 = 3000;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Complete bench configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub serial: SerialConfig,
    pub input: InputConfig,
    pub frame_log: FrameLogConfig,
    pub logging: LoggingConfig,
}

/// `[serial]`: where frames are written.
#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    /// Device path; empty tries `/dev/ttyUSB0` then `/dev/ttyACM0`.
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound on a single frame write.
    pub write_timeout_ms: u64,
}

/// `[input]`: the gamepad standing in for the board's pins and ADC.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// evdev node; empty picks the first device that looks like a gamepad.
    pub device_path: String,
}

/// `[frame_log]`: sampled frames written as JSON lines.
#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct FrameLogConfig {
    pub enabled: bool,
    pub directory: String,
    /// Records per file before a new file is started.
    pub records_per_file: usize,
    /// Newest files kept on disk; older ones are deleted.
    pub files_to_keep: usize,
    /// Log one frame out of every `sample_every`.
    pub sample_every: u64,
}

/// `[logging]`: diagnostics.
#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Daily-rolling log files go here; empty logs to stdout only.
    pub directory: String,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

impl Default for FrameLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: DEFAULT_FRAME_LOG_DIR.to_string(),
            records_per_file: DEFAULT_RECORDS_PER_FILE,
            files_to_keep: DEFAULT_FILES_TO_KEEP,
            sample_every: DEFAULT_SAMPLE_EVERY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: String::new(),
        }
    }
}

fn invalid(section: &str, msg: impl std::fmt::Display) -> GamepadLinkError {
    GamepadLinkError::Config(toml::de::Error::custom(format!("[{}] {}", section, msg)))
}

impl SerialConfig {
    fn validate(&self) -> Result<()> {
        if !SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            return Err(invalid(
                "serial",
                format!("unsupported baud_rate {} (expected one of {:?})", self.baud_rate, SUPPORTED_BAUD_RATES),
            ));
        }
        if !(1..=MAX_WRITE_TIMEOUT_MS).contains(&self.write_timeout_ms) {
            return Err(invalid(
                "serial",
                format!("write_timeout_ms must be 1..={}", MAX_WRITE_TIMEOUT_MS),
            ));
        }
        Ok(())
    }
}

impl FrameLogConfig {
    fn validate(&self) -> Result<()> {
        // Only checked when enabled so a disabled log may leave it blank
        if self.enabled && self.directory.trim().is_empty() {
            return Err(invalid("frame_log", "directory is required when enabled"));
        }
        if self.records_per_file == 0 || self.files_to_keep == 0 {
            return Err(invalid("frame_log", "records_per_file and files_to_keep must be at least 1"));
        }
        if !(1..=MAX_SAMPLE_EVERY).contains(&self.sample_every) {
            return Err(invalid(
                "frame_log",
                format!("sample_every must be 1..={}", MAX_SAMPLE_EVERY),
            ));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.iter().any(|l| l.eq_ignore_ascii_case(&self.level)) {
            return Err(invalid(
                "logging",
                format!("unknown level {:?} (expected one of {:?})", self.level, LOG_LEVELS),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Read, parse and validate a configuration file
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be read
    /// - `Config` if it is not valid TOML, has unknown keys, or a value is out of range
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gamepad_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// println!("Writing frames at {} baud", config.serial.baud_rate);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section, reporting the first problem found
    pub fn validate(&self) -> Result<()> {
        self.serial.validate()?;
        self.frame_log.validate()?;
        self.logging.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Asserts that `edit` turns the default config into an invalid one
    /// whose message names `section`.
    fn assert_rejected(section: &str, edit: impl FnOnce(&mut Config)) {
        let mut config = Config::default();
        edit(&mut config);
        match config.validate() {
            Err(GamepadLinkError::Config(e)) => {
                let msg = e.to_string();
                assert!(msg.contains(&format!("[{}]", section)), "unexpected message: {}", msg);
            }
            other => panic!("Expected Config error for [{}], got: {:?}", section, other),
        }
    }

    // ==================== Loading Tests ====================

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.serial.port.is_empty());
        assert_eq!(config.serial.baud_rate, DEFAULT_BAUD_RATE);
        assert!(config.input.device_path.is_empty());
        assert!(!config.frame_log.enabled);
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[serial]
port = "/dev/ttyUSB1"
baud_rate = 921600

[input]
device_path = "/dev/input/event7"

[frame_log]
enabled = true
sample_every = 10

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 921600);
        assert_eq!(config.serial.write_timeout_ms, DEFAULT_WRITE_TIMEOUT_MS);
        assert_eq!(config.input.device_path, "/dev/input/event7");
        assert!(config.frame_log.enabled);
        assert_eq!(config.frame_log.sample_every, 10);
        assert_eq!(config.frame_log.directory, DEFAULT_FRAME_LOG_DIR);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_text_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.serial.write_timeout_ms, DEFAULT_WRITE_TIMEOUT_MS);
        assert_eq!(config.frame_log.records_per_file, DEFAULT_RECORDS_PER_FILE);
        assert_eq!(config.frame_log.files_to_keep, DEFAULT_FILES_TO_KEEP);
    }

    #[test]
    fn test_shipped_default_file_matches_defaults() {
        let shipped = Config::from_toml(include_str!("../config/default.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(shipped.serial.port, defaults.serial.port);
        assert_eq!(shipped.serial.baud_rate, defaults.serial.baud_rate);
        assert_eq!(shipped.serial.write_timeout_ms, defaults.serial.write_timeout_ms);
        assert_eq!(shipped.frame_log.enabled, defaults.frame_log.enabled);
        assert_eq!(shipped.frame_log.sample_every, defaults.frame_log.sample_every);
        assert_eq!(shipped.logging.level, defaults.logging.level);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Config::load("/nonexistent/gamepad-link.toml"),
            Err(GamepadLinkError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Config::from_toml("[serial\nport = 3"),
            Err(GamepadLinkError::Config(_))
        ));
        assert!(Config::from_toml("[serial]\nbaud_rate = \"fast\"").is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Config::from_toml("[serial]\nbaudrate = 9600").is_err());
        assert!(Config::from_toml("[telemetry]\nenabled = true").is_err());
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_every_supported_baud_rate_accepted() {
        for &baud in SUPPORTED_BAUD_RATES {
            let mut config = Config::default();
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok(), "{} baud should be accepted", baud);
        }
    }

    #[test]
    fn test_serial_rejections() {
        assert_rejected("serial", |c| c.serial.baud_rate = 420_000);
        assert_rejected("serial", |c| c.serial.write_timeout_ms = 0);
        assert_rejected("serial", |c| c.serial.write_timeout_ms = MAX_WRITE_TIMEOUT_MS + 1);
    }

    #[test]
    fn test_frame_log_rejections() {
        assert_rejected("frame_log", |c| {
            c.frame_log.enabled = true;
            c.frame_log.directory = "  ".to_string();
        });
        assert_rejected("frame_log", |c| c.frame_log.records_per_file = 0);
        assert_rejected("frame_log", |c| c.frame_log.files_to_keep = 0);
        assert_rejected("frame_log", |c| c.frame_log.sample_every = 0);
        assert_rejected("frame_log", |c| c.frame_log.sample_every = MAX_SAMPLE_EVERY + 1);
    }

    #[test]
    fn test_blank_directory_allowed_when_disabled() {
        let mut config = Config::default();
        config.frame_log.directory = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_every_upper_bound_inclusive() {
        let mut config = Config::default();
        config.frame_log.sample_every = MAX_SAMPLE_EVERY;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let mut config = Config::default();
        config.logging.level = "WARN".to_string();
        assert!(config.validate().is_ok());

        assert_rejected("logging", |c| c.logging.level = "verbose".to_string());
    }
}
