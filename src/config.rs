//! System configuration parameters
//!
//! All tunable parameters for the SoilWatch monitor. Values are compiled in
//! and may be overridden at boot by a JSON document stored under
//! [`CONFIG_OVERRIDE_KEY`]. The two humidity thresholds are not part of this
//! document: they live in their own durable records (see
//! [`crate::thresholds`]).

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};
use crate::app::retry::RetryPolicy;
use crate::sensors::moisture::Calibration;

/// Durable key holding an optional JSON override of [`MonitorConfig`].
pub const CONFIG_OVERRIDE_KEY: &str = "monitor_config";

/// Built-in lower threshold, used until a stored value is found.
pub const DEFAULT_MIN_HUMIDITY: f32 = 30.0;
/// Built-in upper threshold, used until a stored value is found.
pub const DEFAULT_MAX_HUMIDITY: f32 = 75.0;

/// The two zone boundaries, in humidity percent.
///
/// Intended to satisfy `0 <= min < max <= 100`, but nothing enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub min_humidity: f32,
    pub max_humidity: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_humidity: DEFAULT_MIN_HUMIDITY,
            max_humidity: DEFAULT_MAX_HUMIDITY,
        }
    }
}

impl ThresholdConfig {
    /// Boundary between the WARNING and OK zones.
    pub fn midpoint(&self) -> f32 {
        self.max_humidity - (self.max_humidity - self.min_humidity) / 2.0
    }

    /// Whether the pair is ordered the way the classifier expects.
    pub fn is_ordered(&self) -> bool {
        self.min_humidity < self.max_humidity
    }
}

/// How inbound threshold payloads that are not numbers are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PayloadPolicy {
    /// Parse the longest numeric prefix; anything unparseable becomes 0.0.
    #[default]
    Lenient,
    /// Reject any payload that is not exactly a decimal number.
    Strict,
}

/// Channel names relative to [`MonitorConfig::topic_prefix`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelNames {
    pub min_humidity: String,
    pub max_humidity: String,
    pub indicator_color: String,
    pub humidity: String,
    pub notification: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            min_humidity: "min-humidity".into(),
            max_humidity: "max-humidity".into(),
            indicator_color: "rgb-led".into(),
            humidity: "module-humidity".into(),
            notification: "notification-msg".into(),
        }
    }
}

/// Fully-qualified topic names, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    pub min_threshold: String,
    pub max_threshold: String,
    pub indicator_color: String,
    pub humidity: String,
    pub notification: String,
}

/// Why a stored override was refused.
#[derive(Debug)]
pub enum ConfigError {
    /// The document is not valid JSON for [`MonitorConfig`].
    Parse(serde_json::Error),
    /// `sample_interval_secs` is zero.
    ZeroInterval,
    /// Calibration voltages are not positive or the endpoints coincide.
    DegenerateCalibration,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "unparseable ({})", e),
            Self::ZeroInterval => write!(f, "sample interval must be non-zero"),
            Self::DegenerateCalibration => write!(f, "calibration cannot convert readings"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Core monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // --- Timing ---
    /// Pause between the end of one cycle and the start of the next (seconds)
    pub sample_interval_secs: u32,
    /// Backoff between broker connection attempts
    pub reconnect: RetryPolicy,

    // --- Broker ---
    pub broker_url: String,
    pub broker_username: String,
    #[serde(skip_serializing)]
    pub broker_key: String,
    /// Prepended to every channel name, e.g. `user/feeds/`
    pub topic_prefix: String,
    pub channels: ChannelNames,
    /// Published on the notification channel when there is nothing to report
    pub clear_marker: String,
    pub payload_policy: PayloadPolicy,

    // --- Network ---
    pub wifi_ssid: String,
    #[serde(skip_serializing)]
    pub wifi_password: String,

    // --- Clock ---
    /// Local-time offset applied to log timestamps (seconds east of UTC)
    pub utc_offset_secs: i32,

    // --- Sensor ---
    pub calibration: Calibration,

    // --- Storage ---
    /// Erase the whole durable store before loading anything
    pub format_storage_on_boot: bool,
}

const BUILD_MQTT_USER: &str = match option_env!("SOILWATCH_MQTT_USER") {
    Some(v) => v,
    None => "CHANGE_HERE",
};
const BUILD_MQTT_KEY: &str = match option_env!("SOILWATCH_MQTT_KEY") {
    Some(v) => v,
    None => "CHANGE_HERE",
};
const BUILD_WIFI_SSID: &str = match option_env!("SOILWATCH_WIFI_SSID") {
    Some(v) => v,
    None => "CHANGE_HERE",
};
const BUILD_WIFI_PASS: &str = match option_env!("SOILWATCH_WIFI_PASS") {
    Some(v) => v,
    None => "CHANGE_HERE",
};

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // Timing
            sample_interval_secs: 300, // 5 min
            reconnect: RetryPolicy::default(),

            // Broker
            broker_url: "mqtt://io.adafruit.com:1883".into(),
            broker_username: BUILD_MQTT_USER.into(),
            broker_key: BUILD_MQTT_KEY.into(),
            topic_prefix: format!("{}/feeds/", BUILD_MQTT_USER),
            channels: ChannelNames::default(),
            clear_marker: "-".into(),
            payload_policy: PayloadPolicy::Lenient,

            // Network
            wifi_ssid: BUILD_WIFI_SSID.into(),
            wifi_password: BUILD_WIFI_PASS.into(),

            // Clock
            utc_offset_secs: -10_800, // UTC-3

            // Sensor
            calibration: Calibration::default(),

            // Storage
            format_storage_on_boot: false,
        }
    }
}

impl MonitorConfig {
    /// Resolve channel names against the topic prefix.
    pub fn topics(&self) -> TopicSet {
        let full = |name: &str| format!("{}{}", self.topic_prefix, name);
        TopicSet {
            min_threshold: full(&self.channels.min_humidity),
            max_threshold: full(&self.channels.max_humidity),
            indicator_color: full(&self.channels.indicator_color),
            humidity: full(&self.channels.humidity),
            notification: full(&self.channels.notification),
        }
    }

    /// Reject values the sampling loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if !self.calibration.is_usable() {
            return Err(ConfigError::DegenerateCalibration);
        }
        Ok(())
    }

    /// Parse and validate a JSON override. Fields absent from the document
    /// keep their compiled defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let mut cfg: Self = serde_json::from_slice(bytes).map_err(ConfigError::Parse)?;
        cfg.validate()?;
        // Secrets are never serialised, so an override cannot carry them.
        let defaults = Self::default();
        if cfg.broker_key.is_empty() {
            cfg.broker_key = defaults.broker_key;
        }
        if cfg.wifi_password.is_empty() {
            cfg.wifi_password = defaults.wifi_password;
        }
        Ok(cfg)
    }

    /// Load the stored override, or fall back to compiled defaults.
    pub fn load_or_default(storage: &impl StoragePort) -> Self {
        match storage.read(CONFIG_OVERRIDE_KEY) {
            Ok(bytes) => match Self::from_json(&bytes) {
                Ok(cfg) => {
                    info!("Config: loaded override ({} bytes)", bytes.len());
                    cfg
                }
                Err(e) => {
                    warn!("Config: override rejected ({}), using defaults", e);
                    Self::default()
                }
            },
            Err(StorageError::NotFound) => {
                info!("Config: no override stored, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!("Config: override read failed ({}), using defaults", e);
                Self::default()
            }
        }
    }
}
