//! RGB status LED driver.
//!
//! Three digital outputs drive the discrete R/G/B dies of a
//! common-cathode LED. Channels are plain on/off; there is no dimming.
//!
//! Generic over [`embedded_hal::digital::OutputPin`], so the same driver
//! runs on `esp-idf-hal` `PinDriver`s on the device and on mock pins in
//! tests.

use embedded_hal::digital::{Error as _, OutputPin};
use log::warn;

use crate::classifier::IndicatorColor;

pub struct StatusLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
    current: (bool, bool, bool),
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> StatusLed<R, G, B> {
    /// Take ownership of the three pins and switch everything off.
    pub fn new(red: R, green: G, blue: B) -> Self {
        let mut led = Self {
            red,
            green,
            blue,
            current: (true, true, true),
        };
        led.off();
        led
    }

    /// Drive each channel to the given level.
    pub fn set_channels(&mut self, r: bool, g: bool, b: bool) {
        drive(&mut self.red, r, "R");
        drive(&mut self.green, g, "G");
        drive(&mut self.blue, b, "B");
        self.current = (r, g, b);
    }

    /// Raise the channels of `color` without lowering the others.
    pub fn raise(&mut self, color: IndicatorColor) {
        let (r, g, b) = color.channels();
        let (cr, cg, cb) = self.current;
        self.set_channels(cr || r, cg || g, cb || b);
    }

    pub fn off(&mut self) {
        self.set_channels(false, false, false);
    }

    /// Last commanded `(red, green, blue)` levels.
    pub fn channels(&self) -> (bool, bool, bool) {
        self.current
    }
}

fn drive(pin: &mut impl OutputPin, high: bool, name: &str) {
    let res = if high { pin.set_high() } else { pin.set_low() };
    if let Err(e) = res {
        warn!("StatusLed: {} channel write failed ({:?})", name, e.kind());
    }
}
