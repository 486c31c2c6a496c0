//! Sensor subsystem.
//!
//! A single capacitive moisture probe on ADC1; see [`moisture`].

pub mod moisture;
