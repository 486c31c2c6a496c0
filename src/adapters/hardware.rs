//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`MoistureSensor`] and the [`StatusLed`], exposing them
//! through [`SensorPort`] and [`IndicatorPort`]. This is the only
//! module in the system that touches actual hardware. On non-espidf
//! targets, the sensor reads its injected simulation value.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{IndicatorPort, SensorError, SensorPort};
use crate::classifier::IndicatorColor;
use crate::drivers::status_led::StatusLed;
use crate::sensors::moisture::MoistureSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<R, G, B> {
    sensor: MoistureSensor,
    led: StatusLed<R, G, B>,
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> HardwareAdapter<R, G, B> {
    pub fn new(sensor: MoistureSensor, led: StatusLed<R, G, B>) -> Self {
        Self { sensor, led }
    }

    pub fn led(&self) -> &StatusLed<R, G, B> {
        &self.led
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<R: OutputPin, G: OutputPin, B: OutputPin> SensorPort for HardwareAdapter<R, G, B> {
    fn read_moisture_raw(&mut self) -> Result<u16, SensorError> {
        self.sensor.read_raw()
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<R: OutputPin, G: OutputPin, B: OutputPin> IndicatorPort for HardwareAdapter<R, G, B> {
    fn indicator_off(&mut self) {
        self.led.off();
    }

    fn indicator_on(&mut self, color: IndicatorColor) {
        self.led.raise(color);
    }
}
