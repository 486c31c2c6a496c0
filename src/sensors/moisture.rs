//! Capacitive soil-moisture sensor driver.
//!
//! Reads the analog output through an ESP32 ADC1 channel and converts it to
//! a humidity percentage with a fixed two-point linear calibration.
//!
//! The conversion has two stages:
//!
//! 1. The raw 12-bit count is rescaled by `supply_voltage / sensor_max_voltage`
//!    so that a sensor whose output tops out below the ADC reference still
//!    spans the full count range. The result is truncated to a whole count.
//! 2. The scaled count is mapped linearly from `[dry_scaled, wet_scaled]`
//!    onto `[0, 100]`. Drier soil reads higher, so `dry_scaled` is the larger
//!    endpoint.
//!
//! No clamping is applied: counts outside the calibrated window produce
//! percentages below 0 or above 100.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use serde::{Deserialize, Serialize};

use crate::app::ports::SensorError;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_MOISTURE_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_moisture_adc(raw: u16) {
    SIM_MOISTURE_ADC.store(raw, Ordering::Relaxed);
}

/// Fixed calibration constants for one sensor/board pairing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// ADC reference voltage (V).
    pub supply_voltage: f32,
    /// Highest voltage the sensor can output (V).
    pub sensor_max_voltage: f32,
    /// Scaled count observed in bone-dry soil; maps to 0 %.
    pub dry_scaled: i32,
    /// Scaled count observed in saturated soil; maps to 100 %.
    pub wet_scaled: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            supply_voltage: 3.3,
            sensor_max_voltage: 3.0,
            dry_scaled: 3400,
            wet_scaled: 1400,
        }
    }
}

impl Calibration {
    /// Voltage-domain correction factor applied to every raw count.
    pub fn ratio(&self) -> f32 {
        self.supply_voltage / self.sensor_max_voltage
    }

    /// Stage 1: rescale a raw ADC count, truncating toward zero.
    pub fn scale(&self, raw: u16) -> i32 {
        (f32::from(raw) * self.ratio()) as i32
    }

    /// Stage 2: map a scaled count onto the humidity percentage.
    pub fn percent_from_scaled(&self, scaled: i32) -> f32 {
        let span = (self.dry_scaled - self.wet_scaled) as f32;
        (self.dry_scaled - scaled) as f32 * 100.0 / span
    }

    /// Whether the constants give a finite conversion for every count.
    pub fn is_usable(&self) -> bool {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        positive(self.supply_voltage)
            && positive(self.sensor_max_voltage)
            && self.dry_scaled != self.wet_scaled
    }

    /// Full pipeline: raw ADC count → humidity percent (unclamped).
    pub fn to_percent(&self, raw: u16) -> f32 {
        self.percent_from_scaled(self.scale(raw))
    }
}

/// ADC-backed moisture sensor on [`ADC1_CH_MOISTURE`](crate::drivers::hw_init::ADC1_CH_MOISTURE).
///
/// Returns raw counts only; conversion belongs to the caller's
/// [`Calibration`].
#[derive(Debug, Default)]
pub struct MoistureSensor;

impl MoistureSensor {
    pub fn new() -> Self {
        Self
    }

    pub fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.read_adc()
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(hw_init::ADC1_CH_MOISTURE).map_err(SensorError::AdcReadFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        Ok(SIM_MOISTURE_ADC.load(Ordering::Relaxed))
    }
}
