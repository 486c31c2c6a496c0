//! SoilWatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod classifier;
pub mod config;
pub mod humidity_log;
pub mod thresholds;

pub mod error;
pub mod pins;

// The ESP-IDF-only implementations are guarded by cfg attributes inside;
// on host they fall back to simulation backends.
pub mod adapters;
pub mod drivers;
pub mod sensors;

// Links the std-backed critical-section implementation behind the
// embassy-sync queue.
use critical_section as _;
