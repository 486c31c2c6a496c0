//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: log to serial, keep for tests, etc.

use crate::app::commands::PayloadError;
use crate::app::ports::{BrokerError, SensorError, StorageError};
use crate::classifier::{IndicatorColor, IrrigationZone};
use crate::config::ThresholdConfig;
use crate::thresholds::ThresholdKind;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the thresholds loaded at boot).
    Started { thresholds: ThresholdConfig },

    /// One sampling cycle ran to completion.
    CycleCompleted(CycleReport),

    /// An inbound update replaced a threshold.
    ThresholdChanged {
        which: ThresholdKind,
        old: f32,
        new: f32,
    },

    /// A watering event was appended to the humidity log.
    HumidityLogged { timestamp: String, percent: f32 },

    /// The broker session was re-established after `attempts` tries.
    BrokerReconnected { attempts: u32 },

    /// One of the outbound publishes failed.
    PublishFailed { topic: String, error: BrokerError },

    /// A threshold payload was rejected by the strict policy.
    PayloadRejected { topic: String, error: PayloadError },

    /// The moisture sample could not be taken; the cycle was skipped.
    SensorFailed(SensorError),

    /// A durable write failed; the in-memory state is still current.
    StorageFailed { key: &'static str, error: StorageError },
}

/// Summary of one completed cycle, suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub raw: u16,
    pub percent: f32,
    pub zone: IrrigationZone,
    pub color: IndicatorColor,
    pub logged: bool,
    pub thresholds: ThresholdConfig,
    /// Outbound publishes that failed or were skipped while offline.
    pub publish_failures: u8,
}
