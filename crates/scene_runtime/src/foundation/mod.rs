//! Foundation module - Core utilities and types
//!
//! Fundamental utilities used throughout the runtime:
//! - 2D rectangle math for bounds and viewports
//! - Frame timing and stopwatch utilities
//! - Logging setup

pub mod logging;
pub mod math;
pub mod time;
