//! Append-only humidity event log.
//!
//! One entry is recorded whenever a reading rises more than
//! [`NOISE_MARGIN`] points above the previous cycle's reading, which is
//! taken to mean the plant was watered. Decreases and plateaus are never
//! logged.
//!
//! Each entry is two appends to the `humidity_log` record: a timestamp line,
//! then a value line with one decimal place. The two appends are not atomic,
//! so a power loss in between leaves a dangling timestamp. The reader skips
//! such records (and any other malformed line) instead of failing.
//!
//! ```text
//! 2024-05-01T09:12:44
//! 48.5
//! 2024-05-02T18:30:02
//! 61.0
//! ```

use log::{debug, warn};

use crate::app::ports::{StorageError, StoragePort};

/// Durable key of the log record.
pub const HUMIDITY_LOG_KEY: &str = "humidity_log";

/// Minimum rise (percentage points) that counts as a watering event.
pub const NOISE_MARGIN: f32 = 2.0;

/// One parsed log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    pub percent: f32,
}

/// Result of reading the whole log back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogDump {
    pub entries: Vec<LogEntry>,
    /// Lines that did not form a complete record.
    pub skipped: usize,
}

/// Change-suppressing writer for the humidity log.
#[derive(Debug, Default)]
pub struct HumidityLog {
    written: u32,
}

impl HumidityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries appended since boot.
    pub fn written(&self) -> u32 {
        self.written
    }

    /// Whether `current` is a meaningful increase over `previous`.
    pub fn should_log(current: f32, previous: f32) -> bool {
        current > previous + NOISE_MARGIN
    }

    /// Append an entry if `current` rose enough over `previous`.
    ///
    /// Returns `Ok(true)` when an entry was written.
    pub fn maybe_log(
        &mut self,
        storage: &mut impl StoragePort,
        current: f32,
        previous: f32,
        timestamp: &str,
    ) -> Result<bool, StorageError> {
        if !Self::should_log(current, previous) {
            return Ok(false);
        }
        storage.append(HUMIDITY_LOG_KEY, format!("{}\n", timestamp).as_bytes())?;
        storage.append(HUMIDITY_LOG_KEY, format!("{:.1}\n", current).as_bytes())?;
        self.written = self.written.saturating_add(1);
        debug!("HumidityLog: {} -> {:.1}%", timestamp, current);
        Ok(true)
    }

    /// Read and parse the whole log. A missing or unreadable record yields
    /// an empty dump.
    pub fn read_entries(storage: &impl StoragePort) -> LogDump {
        if !storage.exists(HUMIDITY_LOG_KEY) {
            return LogDump::default();
        }
        match storage.read(HUMIDITY_LOG_KEY) {
            Ok(bytes) => Self::parse(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                warn!("HumidityLog: read failed ({}), treating as empty", e);
                LogDump::default()
            }
        }
    }

    /// Pair timestamp lines with the value line that follows them.
    ///
    /// A timestamp followed by another timestamp is dangling and skipped; a
    /// value with no pending timestamp is an orphan and skipped. Blank lines
    /// are ignored.
    pub fn parse(text: &str) -> LogDump {
        let mut dump = LogDump::default();
        let mut pending: Option<&str> = None;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match parse_value(line) {
                Some(percent) => match pending.take() {
                    Some(ts) => dump.entries.push(LogEntry {
                        timestamp: ts.to_owned(),
                        percent,
                    }),
                    None => dump.skipped += 1,
                },
                None => {
                    if pending.replace(line).is_some() {
                        dump.skipped += 1;
                    }
                }
            }
        }
        if pending.is_some() {
            dump.skipped += 1;
        }
        dump
    }
}

fn parse_value(line: &str) -> Option<f32> {
    line.parse::<f32>().ok().filter(|v| v.is_finite())
}
