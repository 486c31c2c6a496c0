//! Durable holder of the two humidity thresholds.
//!
//! Each threshold is its own record in the durable store, written as text
//! with one decimal place (`"42.5"`). A record is always overwritten, never
//! appended to. Loading is per-scalar: a missing, unreadable or unparseable
//! record leaves that scalar at its compiled-in default without affecting
//! the other one.
//!
//! Updates are accepted as-is. In particular `min < max` is not enforced;
//! an inverted pair is persisted and only reported with a warning.

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::config::{DEFAULT_MAX_HUMIDITY, DEFAULT_MIN_HUMIDITY, ThresholdConfig};

pub const MIN_HUMIDITY_KEY: &str = "min_humidity";
pub const MAX_HUMIDITY_KEY: &str = "max_humidity";

/// Which of the two thresholds an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    Min,
    Max,
}

impl ThresholdKind {
    /// Durable-store key for this threshold.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Min => MIN_HUMIDITY_KEY,
            Self::Max => MAX_HUMIDITY_KEY,
        }
    }

    const fn default_value(self) -> f32 {
        match self {
            Self::Min => DEFAULT_MIN_HUMIDITY,
            Self::Max => DEFAULT_MAX_HUMIDITY,
        }
    }
}

/// In-memory thresholds plus their persistence rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdStore {
    current: ThresholdConfig,
}

impl Default for ThresholdStore {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}

impl ThresholdStore {
    pub fn new(current: ThresholdConfig) -> Self {
        Self { current }
    }

    /// Read both thresholds from `storage`, falling back per scalar.
    pub fn load(storage: &impl StoragePort) -> Self {
        let current = ThresholdConfig {
            min_humidity: Self::load_one(storage, ThresholdKind::Min),
            max_humidity: Self::load_one(storage, ThresholdKind::Max),
        };
        if !current.is_ordered() {
            warn!(
                "Thresholds: stored pair is inverted (min={:.1} max={:.1})",
                current.min_humidity, current.max_humidity
            );
        }
        Self { current }
    }

    fn load_one(storage: &impl StoragePort, kind: ThresholdKind) -> f32 {
        let fallback = kind.default_value();
        match storage.read(kind.key()) {
            Ok(bytes) => match parse_stored(&bytes) {
                Some(value) => {
                    info!("Thresholds: {} = {:.1} (stored)", kind.key(), value);
                    value
                }
                None => {
                    warn!(
                        "Thresholds: {} record unparseable, using default {:.1}",
                        kind.key(),
                        fallback
                    );
                    fallback
                }
            },
            Err(StorageError::NotFound) => {
                info!("Thresholds: {} = {:.1} (default)", kind.key(), fallback);
                fallback
            }
            Err(e) => {
                warn!(
                    "Thresholds: {} read failed ({}), using default {:.1}",
                    kind.key(),
                    e,
                    fallback
                );
                fallback
            }
        }
    }

    /// Snapshot of both thresholds for the classifier.
    pub fn current(&self) -> ThresholdConfig {
        self.current
    }

    pub fn get(&self, kind: ThresholdKind) -> f32 {
        match kind {
            ThresholdKind::Min => self.current.min_humidity,
            ThresholdKind::Max => self.current.max_humidity,
        }
    }

    /// Apply `value` in memory and overwrite its durable record.
    ///
    /// The in-memory value changes even when the write fails, so the next
    /// classification still sees it; the storage error is returned for the
    /// caller to report.
    pub fn update(
        &mut self,
        storage: &mut impl StoragePort,
        kind: ThresholdKind,
        value: f32,
    ) -> Result<(), StorageError> {
        match kind {
            ThresholdKind::Min => self.current.min_humidity = value,
            ThresholdKind::Max => self.current.max_humidity = value,
        }
        if !self.current.is_ordered() {
            warn!(
                "Thresholds: min ({:.1}) is not below max ({:.1}); accepted as-is",
                self.current.min_humidity, self.current.max_humidity
            );
        }
        storage.write(kind.key(), encode_value(value).as_bytes())
    }
}

/// Text form of a threshold record.
pub fn encode_value(value: f32) -> String {
    format!("{:.1}", value)
}

/// Parse a stored record: the last non-empty line, trimmed, as a finite
/// decimal.
fn parse_stored(bytes: &[u8]) -> Option<f32> {
    let text = core::str::from_utf8(bytes).ok()?;
    let line = text.lines().map(str::trim).rfind(|l| !l.is_empty())?;
    line.parse::<f32>().ok().filter(|v| v.is_finite())
}
