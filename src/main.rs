//! SoilWatch Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single blocking sampling loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     FlashStore     MqttBroker    SystemClock  │
//! │  (Sensor+Indicator)  (Storage)      (Broker)      (Clock)      │
//! │  IntervalTimer       LogEventSink                              │
//! │  (Wait + TWDT)       (EventSink)                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MonitorService (pure logic)                 │    │
//! │  │  Thresholds · HumidityLog · Classifier                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;
use log::{info, warn};

use soilwatch::adapters::clock::SystemClock;
use soilwatch::adapters::device_id;
use soilwatch::adapters::flash_store::FlashStore;
use soilwatch::adapters::hardware::HardwareAdapter;
use soilwatch::adapters::log_sink::LogEventSink;
use soilwatch::adapters::mqtt::MqttBroker;
use soilwatch::adapters::timer::IntervalTimer;
use soilwatch::adapters::wifi::{self, WifiCredentials};
use soilwatch::app::ports::StoragePort;
use soilwatch::app::service::{MonitorService, Ports};
use soilwatch::config::MonitorConfig;
use soilwatch::drivers::hw_init;
use soilwatch::drivers::status_led::StatusLed;
use soilwatch::drivers::watchdog::Watchdog;
use soilwatch::error::Error;
use soilwatch::sensors::moisture::MoistureSensor;
use soilwatch::thresholds::ThresholdStore;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SoilWatch v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    hw_init::init_peripherals().map_err(Error::from)?;
    let peripherals = Peripherals::take()?;

    // ── 2. Durable store and configuration ────────────────────
    let mut store = FlashStore::mount().unwrap_or_else(|e| {
        warn!("Flash store unavailable ({}), running with defaults", e);
        FlashStore::unmounted()
    });
    let config = MonitorConfig::load_or_default(&store);
    if config.format_storage_on_boot {
        if let Err(e) = store.format() {
            warn!("Flash format failed ({})", e);
        }
    }

    MonitorService::dump_log(&store);
    let thresholds = ThresholdStore::load(&store);

    // ── 3. Hardware and boot indicator ────────────────────────
    let led = StatusLed::new(
        PinDriver::output(peripherals.pins.gpio25)?,
        PinDriver::output(peripherals.pins.gpio33)?,
        PinDriver::output(peripherals.pins.gpio32)?,
    );
    let sensor = MoistureSensor::new();
    let mut hw = HardwareAdapter::new(sensor, led);

    let mut sink = LogEventSink::new();
    let mut service = MonitorService::new(&config, thresholds);
    service.start(&mut hw, &mut sink);

    let mut timer = IntervalTimer::new(Watchdog::new());

    // ── 4. Network ────────────────────────────────────────────
    let creds =
        WifiCredentials::new(&config.wifi_ssid, &config.wifi_password).map_err(Error::from)?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let _wifi = wifi::connect_station(
        &creds,
        peripherals.modem,
        sysloop,
        nvs,
        &config.reconnect,
        &mut timer,
    )?;
    // Association above blocks inside ESP-IDF past the TWDT timeout, so the
    // task only subscribes once the station is up.
    timer.arm_watchdog();
    let _sntp = EspSntp::new_default()?;
    let clock = SystemClock::new(config.utc_offset_secs);

    let client_id = device_id::client_id(&device_id::read_mac(), device_id::random_suffix());
    let topics = config.topics();
    let mut broker = MqttBroker::start(
        &config.broker_url,
        &client_id,
        &config.broker_username,
        &config.broker_key,
        [topics.min_threshold, topics.max_threshold],
    )?;

    // ── 5. Sampling loop ──────────────────────────────────────
    info!("System ready. Entering sampling loop.");
    let mut ports = Ports {
        hw: &mut hw,
        broker: &mut broker,
        storage: &mut store,
        clock: &clock,
        waiter: &mut timer,
    };
    service.run(&mut ports, &mut sink);

    info!("Sampling loop exited");
    Ok(())
}
