//! Rotating JSONL frame log

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::FrameLogConfig;
use crate::error::Result;
use crate::packet::protocol::GamepadFrame;
use crate::pipeline::FrameStats;

const FILE_PREFIX: &str = "frames_";
const FILE_EXTENSION: &str = ".jsonl";

/// One line of the frame log.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrameRecord {
    /// RFC 3339, millisecond precision, UTC
    pub timestamp: String,
    /// Index of the frame since start-up
    pub sequence: u64,
    /// Button digits exactly as sent on the wire
    pub buttons: String,
    pub left_y: i16,
    pub left_x: i16,
    pub right_y: i16,
    pub right_x: i16,
    /// Frames accepted by the transport so far
    pub sent: u64,
    /// Frames dropped so far
    pub dropped: u64,
}

impl FrameRecord {
    pub fn new(at: DateTime<Utc>, sequence: u64, frame: &GamepadFrame, stats: FrameStats) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            sequence,
            buttons: frame.button_digits(),
            left_y: frame.axes.left_y,
            left_x: frame.axes.left_x,
            right_y: frame.axes.right_y,
            right_x: frame.axes.right_x,
            sent: stats.sent,
            dropped: stats.dropped,
        }
    }
}

/// Writes [`FrameRecord`]s to `frames_<YYYYMMDD_HHMMSS>_<n>.jsonl` files.
///
/// A new file is started after `records_per_file` records; after each
/// rotation only the newest `files_to_keep` files are left on disk.
pub struct FrameLogger {
    dir: PathBuf,
    records_per_file: usize,
    files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    file_index: u32,
}

impl std::fmt::Debug for FrameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLogger")
            .field("dir", &self.dir)
            .field("current_path", &self.current_path)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl FrameLogger {
    /// Create a logger writing into `config.directory`
    ///
    /// The directory is created if it does not exist. No file is opened until
    /// the first record arrives.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created
    pub fn new(config: &FrameLogConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.directory);
        fs::create_dir_all(&dir)?;
        info!("Frame log directory: {}", dir.display());

        Ok(Self {
            dir,
            records_per_file: config.records_per_file.max(1),
            files_to_keep: config.files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            file_index: 0,
        })
    }

    /// Append one record, rotating first if the current file is full
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Json` if the record cannot be written
    pub fn log(&mut self, record: &FrameRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    /// Flush buffered records to disk
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// File currently being written, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    fn rotate(&mut self) -> Result<()> {
        self.flush()?;

        let name = format!(
            "{}{}_{:04}{}",
            FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            self.file_index,
            FILE_EXTENSION
        );
        self.file_index = self.file_index.wrapping_add(1);

        let path = self.dir.join(name);
        let file = File::create(&path)?;
        debug!("Opened frame log {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Delete the oldest log files beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_frame_log(path))
            .collect();

        if files.len() <= self.files_to_keep {
            return Ok(());
        }

        // Names sort chronologically
        files.sort();
        let excess = files.len() - self.files_to_keep;
        for old in &files[..excess] {
            match fs::remove_file(old) {
                Ok(()) => debug!("Removed old frame log {}", old.display()),
                Err(e) => warn!("Failed to remove old frame log {}: {}", old.display(), e),
            }
        }
        Ok(())
    }
}

impl Drop for FrameLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("Failed to flush frame log: {}", e);
        }
    }
}

fn is_frame_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION))
        .unwrap_or(false)
}
