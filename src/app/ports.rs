//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (moisture sensor, status LED, broker, flash store, clock,
//! timer, event sinks) implement these traits. The
//! [`MonitorService`](super::service::MonitorService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! All ports are called from a single thread of control. An adapter that
//! receives data on another task (e.g. the MQTT client callback) must hand
//! it over through a queue and surface it from [`BrokerPort::poll_inbound`].

use core::time::Duration;

use crate::classifier::IndicatorColor;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per cycle.
pub trait SensorPort {
    /// Take one raw moisture sample in the ADC's native range (0–4095).
    fn read_moisture_raw(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → tri-color LED)
// ───────────────────────────────────────────────────────────────

/// Three independent binary outputs (red, green, blue), driven as a set.
pub trait IndicatorPort {
    /// Drive every channel low.
    fn indicator_off(&mut self);

    /// Raise the channels that make up `color`. Channels not part of
    /// `color` are left as they are, so callers switch off first.
    fn indicator_on(&mut self, color: IndicatorColor);
}

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: domain ↔ telemetry broker)
// ───────────────────────────────────────────────────────────────

/// A message received on one of the subscribed channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Publish/subscribe transport to the remote telemetry broker.
pub trait BrokerPort {
    /// Whether the session is currently live.
    fn is_connected(&self) -> bool;

    /// Make one connection attempt. On success the adapter has already
    /// (re)subscribed to the threshold channels.
    fn connect(&mut self) -> Result<(), BrokerError>;

    /// Pop the next queued inbound message, if any.
    fn poll_inbound(&mut self) -> Option<InboundMessage>;

    /// Publish a plain-text payload on `topic`.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), BrokerError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ flash filesystem)
// ───────────────────────────────────────────────────────────────

/// Key-addressed durable byte store.
///
/// Each key names one record. `write` replaces the record; `append` extends
/// it. Appends are not transactional across calls: two consecutive appends
/// may be separated by a power loss.
pub trait StoragePort {
    /// Read the full record stored under `key`.
    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace the record under `key` with `data`.
    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Append `data` to the record under `key`, creating it if absent.
    fn append(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, key: &str) -> bool;

    /// Erase every record in the store.
    fn format(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for log timestamps.
pub trait ClockPort {
    /// Human-readable local timestamp. Successive calls never go backwards.
    fn timestamp(&self) -> String;
}

// ───────────────────────────────────────────────────────────────
// Wait port (interruptible suspension)
// ───────────────────────────────────────────────────────────────

/// How a [`WaitPort::wait`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration passed.
    Elapsed,
    /// The wait was cut short by a stop request.
    Interrupted,
}

/// Suspends the caller for a duration. Used for the end-of-cycle interval
/// and for reconnect backoff.
pub trait WaitPort {
    fn wait(&mut self, duration: Duration) -> WaitOutcome;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`SensorPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error.
    AdcReadFailed(i32),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// The filesystem is not mounted or could not be opened.
    Unavailable,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`BrokerPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerError {
    /// Connection attempt failed; carries the transport's return code.
    ConnectFailed(i32),
    /// Operation requires a live session.
    NotConnected,
    /// Subscribing to a threshold channel failed.
    SubscribeFailed,
    /// The transport refused or dropped the publish.
    PublishFailed,
}

impl core::fmt::Display for SensorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcReadFailed(rc) => write!(f, "ADC read failed (rc={})", rc),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Unavailable => write!(f, "store unavailable"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConnectFailed(rc) => write!(f, "connect failed (rc={})", rc),
            Self::NotConnected => write!(f, "not connected"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::PublishFailed => write!(f, "publish failed"),
        }
    }
}
