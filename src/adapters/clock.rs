//! Wall-clock adapter.
//!
//! Implements [`ClockPort`] on top of the system real-time clock, which
//! SNTP keeps in sync on the device. Timestamps are rendered in a fixed
//! local offset as `YYYY-MM-DDTHH:MM:SS`.
//!
//! The RTC may step backwards when SNTP first syncs or corrects drift.
//! Log timestamps must never go backwards, so the adapter remembers the
//! latest second it handed out and never returns an earlier one.

use core::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use log::warn;

use crate::app::ports::ClockPort;

/// Anything earlier means the RTC has not been synced yet.
const EPOCH_2020: i64 = 1_577_836_800;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct SystemClock {
    offset: FixedOffset,
    last_secs: Cell<i64>,
    warned_unsynced: Cell<bool>,
}

impl SystemClock {
    /// `utc_offset_secs` is seconds east of UTC. An out-of-range offset
    /// falls back to UTC.
    pub fn new(utc_offset_secs: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| {
            warn!("Clock: offset {}s out of range, using UTC", utc_offset_secs);
            Utc.fix()
        });
        Self {
            offset,
            last_secs: Cell::new(i64::MIN),
            warned_unsynced: Cell::new(false),
        }
    }

    /// Render `epoch_secs`, clamped so it is never earlier than the last
    /// value this clock returned.
    pub fn timestamp_at(&self, epoch_secs: i64) -> String {
        let secs = epoch_secs.max(self.last_secs.get());
        self.last_secs.set(secs);
        format_timestamp(secs, self.offset)
    }
}

impl ClockPort for SystemClock {
    fn timestamp(&self) -> String {
        let now = now_epoch_secs();
        if now < EPOCH_2020 && !self.warned_unsynced.replace(true) {
            warn!("Clock: RTC not synced yet, timestamps will be near 1970");
        }
        self.timestamp_at(now)
    }
}

fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

/// Format `epoch_secs` in `offset` local time.
pub fn format_timestamp(epoch_secs: i64, offset: FixedOffset) -> String {
    match DateTime::from_timestamp(epoch_secs, 0) {
        Some(utc) => utc.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string(),
        None => epoch_secs.to_string(),
    }
}
