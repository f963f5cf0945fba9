//! # Gamepad Link Library
//!
//! Scans eight debounced buttons and four analog stick channels and streams
//! them as text frames (`B:bbbbbbbb,A:ly,lx,ry,rx\n`) every 20 ms.
//!
//! The sampling core (`input`, `packet`, `pipeline`) only talks to the
//! board through the traits in [`hal`]. The `board` and `serial` modules
//! implement those traits on a Linux host, with an evdev gamepad standing in
//! for the GPIO bank and ADC.

pub mod board;
pub mod config;
pub mod error;
pub mod hal;
pub mod input;
pub mod packet;
pub mod pipeline;
pub mod serial;
pub mod telemetry;
