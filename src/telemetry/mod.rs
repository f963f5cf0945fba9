//! # Telemetry Module
//!
//! Samples outgoing frames into JSONL files for offline inspection.
//!
//! This module handles:
//! - Formatting sampled frames as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only the last M files

pub mod logger;

pub use logger::{FrameLogger, FrameRecord};
