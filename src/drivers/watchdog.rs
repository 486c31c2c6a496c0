//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the main task
//! stalls for longer than [`TIMEOUT_MS`].
//!
//! A new [`Watchdog`] is inert: feeds are no-ops until [`Watchdog::subscribe`]
//! attaches the current task. Boot steps that block in ESP-IDF calls for
//! longer than the timeout (WiFi association) run before subscribing.
//! After that the sampling loop spends almost all of its time inside
//! interval and backoff waits, and the wait adapter feeds the watchdog on
//! every slice.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

/// Time without a feed after which the device panics and reboots.
pub const TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: core::cell::Cell<u64>,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Unsubscribed handle.
    pub fn new() -> Self {
        Self {
            subscribed: false,
            #[cfg(not(target_os = "espidf"))]
            feeds: core::cell::Cell::new(0),
        }
    }

    /// Configure the TWDT and subscribe the current task. Idempotent.
    pub fn subscribe(&mut self) -> bool {
        if self.subscribed {
            return true;
        }

        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: TIMEOUT_MS,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: plain FFI calls with a stack config that outlives them.
            let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            if ret != ESP_OK {
                log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
            }

            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            self.subscribed = ret == ESP_OK;
            if self.subscribed {
                info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", TIMEOUT_MS);
            } else {
                log::warn!("Watchdog: failed to subscribe ({})", ret);
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): subscribed");
            self.subscribed = true;
        }

        self.subscribed
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Feed the watchdog. Once subscribed, must be called at least every
    /// [`TIMEOUT_MS`].
    pub fn feed(&self) {
        if !self.subscribed {
            return;
        }

        #[cfg(target_os = "espidf")]
        // SAFETY: the current task is subscribed.
        unsafe {
            esp_task_wdt_reset();
        }

        #[cfg(not(target_os = "espidf"))]
        self.feeds.set(self.feeds.get() + 1);
    }

    /// Number of feeds while subscribed (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u64 {
        self.feeds.get()
    }
}
