//! Interruptible wait adapter.
//!
//! Implements [`WaitPort`] by sleeping in short slices. Between slices it
//! feeds the task watchdog and checks a shared stop flag, so a five-minute
//! sample interval neither trips the TWDT nor blocks a shutdown request
//! for more than one slice.
//!
//! On ESP-IDF each slice is a FreeRTOS delay (the idle task keeps
//! running); on host/test it is `std::thread::sleep`.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;

use log::info;

use crate::app::ports::{WaitOutcome, WaitPort};
use crate::drivers::watchdog::Watchdog;

/// Default slice length. Must stay well under the watchdog timeout.
pub const DEFAULT_SLICE: Duration = Duration::from_secs(1);

/// Cloneable handle that cuts every current and future wait short.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        if !self.0.swap(true, Ordering::AcqRel) {
            info!("Timer: stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct IntervalTimer {
    stop: StopHandle,
    watchdog: Watchdog,
    slice: Duration,
}

impl IntervalTimer {
    pub fn new(watchdog: Watchdog) -> Self {
        Self::with_slice(watchdog, DEFAULT_SLICE)
    }

    pub fn with_slice(watchdog: Watchdog, slice: Duration) -> Self {
        Self {
            stop: StopHandle::default(),
            watchdog,
            slice: slice.max(Duration::from_millis(1)),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    /// Subscribe the calling task to the watchdog. Waits before this only
    /// sleep; waits after it feed on every slice.
    pub fn arm_watchdog(&mut self) -> bool {
        self.watchdog.subscribe()
    }

    #[cfg(target_os = "espidf")]
    fn sleep(d: Duration) {
        esp_idf_hal::delay::FreeRtos::delay_ms(d.as_millis().min(u128::from(u32::MAX)) as u32);
    }

    #[cfg(not(target_os = "espidf"))]
    fn sleep(d: Duration) {
        std::thread::sleep(d);
    }
}

impl WaitPort for IntervalTimer {
    fn wait(&mut self, duration: Duration) -> WaitOutcome {
        let mut remaining = duration;
        loop {
            self.watchdog.feed();
            if self.stop.is_stopped() {
                return WaitOutcome::Interrupted;
            }
            if remaining.is_zero() {
                return WaitOutcome::Elapsed;
            }
            let step = remaining.min(self.slice);
            Self::sleep(step);
            remaining -= step;
        }
    }
}
