//! # Gamepad Link
//!
//! Streams debounced buttons and calibrated sticks from a bench gamepad to a
//! serial port as `B:bbbbbbbb,A:ly,lx,ry,rx\n` frames at 50 Hz.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use gamepad_link::board::gamepad::BenchGamepad;
use gamepad_link::board::{self, BoardLevels, SimAdc, SimPins, TracingLed};
use gamepad_link::config::Config;
use gamepad_link::error::GamepadLinkError;
use gamepad_link::input::calibration::calibrate;
use gamepad_link::pipeline::{self, Shared, FRAME_PERIOD_TICKS};
use gamepad_link::serial::{self, transport};
use gamepad_link::telemetry::{FrameLogger, FrameRecord};

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Tick period in milliseconds (1 kHz)
const TICK_PERIOD_MS: u64 = 1;

/// Number of frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 250;

/// How long to wait for the writer to drain on shutdown
const SHUTDOWN_DRAIN_MS: u64 = 500;

/// Main entry point for Gamepad Link
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration and set up logging
///    - Open the bench gamepad and start the reader thread
///    - Calibrate stick zero offsets (blocking, ~200 ms)
///    - Open the serial port and start the frame writer
///
/// 2. **Main Loop**
///    - Run the 1 kHz tick (debounce, 20-tick conversion trigger, heartbeat)
///    - Render and queue a frame for each completed conversion
///    - Sample frames into the frame log when enabled
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Shutdown**
///    - Stop queueing frames and let the writer drain
///    - Exit with an error if the pipeline halted on a fault
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config(std::env::args().nth(1).map(PathBuf::from))?;
    let _log_guard = init_logging(&config)?;

    info!("Gamepad Link v{} starting...", env!("CARGO_PKG_VERSION"));

    let shared = Arc::new(Shared::new());
    let levels = Arc::new(BoardLevels::new());

    // Input
    let gamepad = BenchGamepad::open(&config.input).context("Failed to open input device")?;
    let _reader = board::spawn_reader(gamepad, Arc::clone(&levels), Arc::clone(&shared))?;

    // Calibration must finish before the pipeline can be armed
    let (mut adc, mut conversions) = SimAdc::new(Arc::clone(&levels));
    let (adc, offsets) = tokio::task::spawn_blocking(move || {
        let offsets = calibrate(&mut adc);
        (adc, offsets)
    })
    .await?;
    let offsets = offsets.context("Stick calibration failed")?;

    // Output
    let port = serial::open(&config.serial)?;
    let (frame_tx, frame_rx) = transport::frame_channel();
    let writer = tokio::spawn(transport::run_writer(
        frame_rx,
        port,
        Duration::from_millis(config.serial.write_timeout_ms),
    ));

    let (mut tick, mut conversion) = pipeline::arm(
        Arc::clone(&shared),
        offsets,
        SimPins::new(Arc::clone(&levels)),
        adc,
        TracingLed::default(),
        frame_tx,
    );

    let mut frame_log = if config.frame_log.enabled {
        Some(FrameLogger::new(&config.frame_log)?)
    } else {
        None
    };

    let mut tick_interval = interval(Duration::from_millis(TICK_PERIOD_MS));
    // Late ticks are caught up so debounce windows keep their length in ticks
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Streaming frames every {} ticks ({}Hz)",
        FRAME_PERIOD_TICKS,
        1000 / (TICK_PERIOD_MS * u64::from(FRAME_PERIOD_TICKS))
    );
    info!("Press Ctrl+C to exit");

    let mut frame_count: u64 = 0;

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                tick.on_tick();
                if shared.is_halted() {
                    break;
                }
            }

            Some(raw) = conversions.recv() => {
                let Some(frame) = conversion.on_conversion_complete(&raw) else {
                    continue;
                };
                frame_count += 1;

                if let Some(logger) = frame_log.as_mut() {
                    if frame_count % config.frame_log.sample_every == 0 {
                        let record = FrameRecord::new(Utc::now(), frame_count, &frame, conversion.stats());
                        if let Err(e) = logger.log(&record) {
                            warn!("Frame log write failed, disabling frame log: {}", e);
                            frame_log = None;
                        }
                    }
                }

                if frame_count % LOG_INTERVAL_FRAMES == 0 {
                    let stats = conversion.stats();
                    info!(
                        "Sent {} frames ({} dropped), buttons {}, axes {:?}",
                        stats.sent,
                        stats.dropped,
                        frame.button_digits(),
                        frame.axes.to_array()
                    );
                }
            }

            _ = &mut shutdown => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    let stats = conversion.stats();
    info!("Total frames: {} sent, {} dropped", stats.sent, stats.dropped);

    // Dropping the handlers closes the frame queue and lets the writer finish
    drop(conversion);
    drop(tick);
    match tokio::time::timeout(Duration::from_millis(SHUTDOWN_DRAIN_MS), writer).await {
        Ok(Ok(writer_stats)) => debug!("Writer finished: {:?}", writer_stats),
        Ok(Err(e)) => warn!("Writer task failed: {}", e),
        Err(_) => warn!("Writer did not drain within {} ms", SHUTDOWN_DRAIN_MS),
    }

    if let Some(mut logger) = frame_log {
        logger.flush()?;
    }

    if shared.is_halted() {
        return Err(GamepadLinkError::Halted.into());
    }
    Ok(())
}

/// Load the config at `path`, or the default config file if present
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` overrides the configured level. The returned guard must be held
/// for the file layer to keep flushing.
fn init_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.to_ascii_lowercase()))
        .context("Invalid log filter")?;

    let (file_layer, guard) = if config.logging.directory.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.logging.directory, "gamepad-link.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
