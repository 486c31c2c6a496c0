//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                 | Connects to               |
//! |---------------|----------------------------|---------------------------|
//! | `hardware`    | SensorPort · IndicatorPort | ESP32 ADC1, RGB LED GPIO  |
//! | `flash_store` | StoragePort                | SPIFFS / in-memory map    |
//! | `mqtt`        | BrokerPort                 | ESP-IDF MQTT / SimBroker  |
//! | `clock`       | ClockPort                  | SNTP-synced RTC           |
//! | `timer`       | WaitPort                   | FreeRTOS delay + TWDT     |
//! | `log_sink`    | EventSink                  | Serial log output         |
//! | `wifi`        | —                          | ESP-IDF WiFi STA          |
//! | `device_id`   | —                          | eFuse MAC, hardware RNG   |

pub mod clock;
pub mod device_id;
pub mod flash_store;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod timer;
pub mod wifi;
