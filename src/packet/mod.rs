//! # Frame Protocol Module
//!
//! The line-oriented text frame carrying one button + axis snapshot.
//!
//! This module handles:
//! - Frame types and wire constants
//! - Rendering frames without per-frame heap growth
//! - Parsing and validating frames on the receiving side

pub mod protocol;
pub mod encoder;
pub mod decoder;
