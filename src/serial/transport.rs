//! # Frame Transport
//!
//! Non-blocking hand-off from the conversion handler to an async serial
//! writer task.
//!
//! The conversion handler calls [`Transport::send`], which only enqueues the
//! frame on a small bounded channel. [`run_writer`] drains the channel and
//! writes each frame to the port. When the writer falls behind the queue
//! fills and new frames are dropped; a failed write drops that frame. Either
//! way the next frame, 20 ms later, supersedes it.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::port_trait::SerialPortIO;
use crate::error::{GamepadLinkError, Result};
use crate::hal::Transport;

/// Frames that may wait for the writer before new ones are dropped.
pub const FRAME_QUEUE_DEPTH: usize = 4;

/// Sending half of the frame queue.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Bytes>,
}

/// Creates a frame queue of [`FRAME_QUEUE_DEPTH`] frames.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use gamepad_link::hal::Transport;
/// use gamepad_link::serial::transport::frame_channel;
///
/// let (mut transport, mut rx) = frame_channel();
/// transport.send(Bytes::from_static(b"B:00000000,A:0,0,0,0\n"))?;
/// assert!(rx.try_recv().is_ok());
/// # Ok::<(), gamepad_link::error::GamepadLinkError>(())
/// ```
pub fn frame_channel() -> (ChannelTransport, mpsc::Receiver<Bytes>) {
    let (tx, rx) = mpsc::channel(FRAME_QUEUE_DEPTH);
    (ChannelTransport { tx }, rx)
}

impl Transport for ChannelTransport {
    fn send(&mut self, frame: Bytes) -> Result<()> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => GamepadLinkError::TransportBusy,
            mpsc::error::TrySendError::Closed(_) => GamepadLinkError::TransportClosed,
        })
    }
}

/// Writer task counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Frames fully written and flushed
    pub written: u64,
    /// Frames lost to write errors
    pub failed: u64,
    /// Frames lost to write timeouts
    pub timed_out: u64,
}

/// Drains the frame queue into `port` until every sender is dropped.
///
/// Each write is bounded by `write_timeout`. Failures are logged once per
/// outage and otherwise counted.
pub async fn run_writer<P: SerialPortIO>(
    mut rx: mpsc::Receiver<Bytes>,
    mut port: P,
    write_timeout: Duration,
) -> WriterStats {
    let mut stats = WriterStats::default();
    let mut healthy = true;

    info!("Frame writer started on {}", port.name());

    while let Some(frame) = rx.recv().await {
        match tokio::time::timeout(write_timeout, port.write_frame(&frame)).await {
            Ok(Ok(())) => {
                stats.written += 1;
                if !healthy {
                    info!("Serial writes to {} recovered", port.name());
                    healthy = true;
                }
            }
            Ok(Err(e)) => {
                stats.failed += 1;
                if healthy {
                    warn!("Serial write to {} failed, dropping frames: {}", port.name(), e);
                    healthy = false;
                } else {
                    debug!("Serial write failed: {}", e);
                }
            }
            Err(_) => {
                stats.timed_out += 1;
                if healthy {
                    warn!(
                        "Serial write to {} timed out after {:?}, dropping frames",
                        port.name(),
                        write_timeout
                    );
                    healthy = false;
                }
            }
        }
    }

    info!(
        "Frame writer stopped: {} written, {} failed, {} timed out",
        stats.written, stats.failed, stats.timed_out
    );
    stats
}
