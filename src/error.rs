//! Unified error types for the SoilWatch firmware.
//!
//! Each port defines its own narrow error enum (see [`crate::app::ports`]);
//! this module gathers them into a single `Error` that adapters and the
//! binary entry point can funnel into. None of these are fatal inside the
//! sampling cycle: the service degrades to a default, a skipped step, or a
//! retry.

use core::fmt;

use crate::adapters::wifi::ConnectivityError;
use crate::app::commands::PayloadError;
use crate::app::ports::{BrokerError, SensorError, StorageError};
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The moisture sensor could not be sampled.
    Sensor(SensorError),
    /// The durable store failed.
    Storage(StorageError),
    /// The message broker failed.
    Broker(BrokerError),
    /// An inbound payload could not be decoded.
    Payload(PayloadError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
    /// WiFi credentials were rejected or the station never associated.
    Network(ConnectivityError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Broker(e) => write!(f, "broker: {e}"),
            Self::Payload(e) => write!(f, "payload: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<BrokerError> for Error {
    fn from(e: BrokerError) -> Self {
        Self::Broker(e)
    }
}

impl From<PayloadError> for Error {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Network(e)
    }
}
