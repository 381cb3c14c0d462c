//! Core runtime modules
//!
//! Subsystem-independent pieces: the unified configuration system.

pub mod config;
