//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { thresholds } => {
                info!(
                    "START | min={:.1}% max={:.1}%",
                    thresholds.min_humidity, thresholds.max_humidity
                );
            }
            AppEvent::CycleCompleted(r) => {
                info!(
                    "CYCLE | raw={} | {:.1}% | {} {} | logged={} | min={:.1} max={:.1} | \
                     publish_failures={}",
                    r.raw,
                    r.percent,
                    r.zone.as_str(),
                    r.color.hex(),
                    r.logged,
                    r.thresholds.min_humidity,
                    r.thresholds.max_humidity,
                    r.publish_failures,
                );
            }
            AppEvent::ThresholdChanged { which, old, new } => {
                info!("THRESH | {} {:.1} -> {:.1}", which.key(), old, new);
            }
            AppEvent::HumidityLogged { timestamp, percent } => {
                info!("LOG | {} | {:.1}%", timestamp, percent);
            }
            AppEvent::BrokerReconnected { attempts } => {
                info!("BROKER | connected after {} attempt(s)", attempts);
            }
            AppEvent::PublishFailed { topic, error } => {
                warn!("BROKER | publish to {} failed: {}", topic, error);
            }
            AppEvent::PayloadRejected { topic, error } => {
                warn!("THRESH | rejected payload on {}: {}", topic, error);
            }
            AppEvent::SensorFailed(e) => {
                warn!("CYCLE | skipped: {}", e);
            }
            AppEvent::StorageFailed { key, error } => {
                warn!("STORE | {} not persisted: {}", key, error);
            }
        }
    }
}
