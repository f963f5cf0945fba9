//! # Input Module
//!
//! Button and analog stick conditioning.
//!
//! This module handles:
//! - Button identifiers and per-button tables
//! - Edge-triggered, tick-timed debouncing with an anti-stuck re-poll
//! - Startup zero-offset calibration of the stick channels
//! - Scaling, axis routing and dead zone

pub mod button;
pub mod debounce;
pub mod calibration;
