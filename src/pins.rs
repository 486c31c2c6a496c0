//! GPIO / peripheral pin assignments for the SoilWatch board.
//!
//! The status LED sits on GPIO 25 (red), 33 (green) and 32 (blue). Those
//! pins are claimed as typed `esp-idf-hal` peripherals in `main.rs`, so they
//! have no numeric constants here.

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive soil-moisture probe, analog output.
/// ADC1 channel 6 (GPIO 34 on ESP32). ADC2 pins are unusable while WiFi
/// is up, so the probe must sit on ADC1.
pub const SENSOR_ADC_GPIO: i32 = 34;

/// Largest raw sample at the configured 12-bit ADC width.
pub const ADC_MAX_RAW: u16 = 4095;
