//! Irrigation classifier.
//!
//! Maps a humidity reading and the current thresholds onto one of three
//! zones. The decision is evaluated from scratch every cycle with no memory
//! of the previous zone, so a reading sitting exactly on a boundary may flip
//! the indicator from one cycle to the next.
//!
//! ```text
//!   0 ──────── min ─────────── mid ─────────────── 100
//!   │ CRITICAL  │    WARNING    │        OK          │
//!   └─── ≤ min ─┘   < mid        └──── ≥ mid ────────┘
//!
//!   mid = max - (max - min) / 2
//! ```

use crate::config::ThresholdConfig;

/// Notification published for the CRITICAL zone.
pub const NOTIFY_CRITICAL: &str = "soil is dry, needs water immediately.";
/// Notification published for the WARNING zone.
pub const NOTIFY_WARNING: &str = "soil is getting dry.";

/// Classification bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrrigationZone {
    Critical,
    Warning,
    Ok,
}

impl IrrigationZone {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Ok => "OK",
        }
    }
}

/// Colours the tri-channel indicator can show.
///
/// `Blue` is only used as the boot indicator; the classifier never
/// returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorColor {
    Red,
    /// Red and green together.
    Yellow,
    Green,
    Blue,
}

impl IndicatorColor {
    /// `#RRGGBB` form published on the indicator channel.
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Red => "#FF0000",
            Self::Yellow => "#FFFF00",
            Self::Green => "#00FF00",
            Self::Blue => "#0000FF",
        }
    }

    /// Channel states as `(red, green, blue)`.
    pub const fn channels(self) -> (bool, bool, bool) {
        match self {
            Self::Red => (true, false, false),
            Self::Yellow => (true, true, false),
            Self::Green => (false, true, false),
            Self::Blue => (false, false, true),
        }
    }
}

/// Everything one cycle needs to drive the indicator and publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub zone: IrrigationZone,
    pub color: IndicatorColor,
    /// `None` means "clear any outstanding alert".
    pub notification: Option<&'static str>,
}

/// Classify `humidity` against `cfg`. First match wins.
pub fn classify(humidity: f32, cfg: &ThresholdConfig) -> Classification {
    if humidity <= cfg.min_humidity {
        Classification {
            zone: IrrigationZone::Critical,
            color: IndicatorColor::Red,
            notification: Some(NOTIFY_CRITICAL),
        }
    } else if humidity < cfg.midpoint() {
        Classification {
            zone: IrrigationZone::Warning,
            color: IndicatorColor::Yellow,
            notification: Some(NOTIFY_WARNING),
        }
    } else {
        Classification {
            zone: IrrigationZone::Ok,
            color: IndicatorColor::Green,
            notification: None,
        }
    }
}
