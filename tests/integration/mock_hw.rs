//! Mock adapters for integration tests.
//!
//! Records every indicator call, wait and event so tests can assert on
//! the full history without touching real GPIO or sleeping. The broker
//! and the durable store are the library's own simulation backends.

use std::collections::VecDeque;
use std::time::Duration;

use soilwatch::adapters::flash_store::FlashStore;
use soilwatch::adapters::mqtt::SimBroker;
use soilwatch::app::events::AppEvent;
use soilwatch::app::ports::{
    ClockPort, EventSink, IndicatorPort, SensorError, SensorPort, WaitOutcome, WaitPort,
};
use soilwatch::app::service::{CycleOutcome, MonitorService, Ports};
use soilwatch::classifier::IndicatorColor;
use soilwatch::config::{MonitorConfig, TopicSet};
use soilwatch::sensors::moisture::Calibration;
use soilwatch::thresholds::ThresholdStore;

pub const PREFIX: &str = "tester/feeds/";

/// Raw count that reads as exactly `percent` under [`unity_calibration`].
pub fn raw_for(percent: u16) -> u16 {
    3400 - percent * 20
}

/// Default endpoints without voltage rescaling, so raw == scaled.
pub fn unity_calibration() -> Calibration {
    Calibration {
        supply_voltage: 3.0,
        sensor_max_voltage: 3.0,
        ..Default::default()
    }
}

pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        topic_prefix: PREFIX.into(),
        calibration: unity_calibration(),
        ..Default::default()
    }
}

// ── Indicator call record ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorCall {
    Off,
    On(IndicatorColor),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    readings: VecDeque<Result<u16, SensorError>>,
    pub reads: u32,
    pub calls: Vec<IndicatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            readings: VecDeque::new(),
            reads: 0,
            calls: Vec::new(),
        }
    }

    /// Queue a reading for the next sample.
    pub fn push_percent(&mut self, percent: u16) {
        self.readings.push_back(Ok(raw_for(percent)));
    }

    pub fn push_failure(&mut self, rc: i32) {
        self.readings.push_back(Err(SensorError::AdcReadFailed(rc)));
    }

    /// Colour currently showing, replaying the call history.
    pub fn showing(&self) -> Option<IndicatorColor> {
        match self.calls.last() {
            Some(IndicatorCall::On(c)) => Some(*c),
            _ => None,
        }
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_moisture_raw(&mut self) -> Result<u16, SensorError> {
        self.reads += 1;
        self.readings
            .pop_front()
            .unwrap_or(Err(SensorError::AdcReadFailed(-1)))
    }
}

impl IndicatorPort for MockHardware {
    fn indicator_off(&mut self) {
        self.calls.push(IndicatorCall::Off);
    }

    fn indicator_on(&mut self, color: IndicatorColor) {
        self.calls.push(IndicatorCall::On(color));
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Hands out `2024-05-01T09:MM:00`, one minute later on every call.
pub struct MockClock {
    ticks: std::cell::Cell<u32>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            ticks: std::cell::Cell::new(0),
        }
    }
}

impl ClockPort for MockClock {
    fn timestamp(&self) -> String {
        let n = self.ticks.get();
        self.ticks.set(n + 1);
        format!("2024-05-01T09:{:02}:00", n % 60)
    }
}

// ── MockWaiter ────────────────────────────────────────────────

/// Records requested waits without sleeping. Interrupts once
/// `interrupt_at` waits have been requested.
pub struct MockWaiter {
    pub waits: Vec<Duration>,
    pub interrupt_at: Option<usize>,
}

impl MockWaiter {
    pub fn new() -> Self {
        Self {
            waits: Vec::new(),
            interrupt_at: None,
        }
    }
}

impl WaitPort for MockWaiter {
    fn wait(&mut self, duration: Duration) -> WaitOutcome {
        self.waits.push(duration);
        match self.interrupt_at {
            Some(n) if self.waits.len() >= n => WaitOutcome::Interrupted,
            _ => WaitOutcome::Elapsed,
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig: service plus every mock, wired together ──────────────

pub struct Rig {
    pub svc: MonitorService,
    pub hw: MockHardware,
    pub broker: SimBroker,
    pub store: FlashStore,
    pub clock: MockClock,
    pub waiter: MockWaiter,
    pub sink: RecordingSink,
    pub topics: TopicSet,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: MonitorConfig) -> Self {
        Self::with_store(config, FlashStore::new())
    }

    /// Boot against an existing store, as after a restart.
    pub fn with_store(config: MonitorConfig, store: FlashStore) -> Self {
        let topics = config.topics();
        let thresholds = ThresholdStore::load(&store);
        let broker = SimBroker::new([topics.min_threshold.clone(), topics.max_threshold.clone()]);
        let mut rig = Self {
            svc: MonitorService::new(&config, thresholds),
            hw: MockHardware::new(),
            broker,
            store,
            clock: MockClock::new(),
            waiter: MockWaiter::new(),
            sink: RecordingSink::default(),
            topics,
        };
        rig.svc.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    pub fn cycle(&mut self) -> CycleOutcome {
        let mut ports = Ports {
            hw: &mut self.hw,
            broker: &mut self.broker,
            storage: &mut self.store,
            clock: &self.clock,
            waiter: &mut self.waiter,
        };
        self.svc.run_cycle(&mut ports, &mut self.sink)
    }

    pub fn run(&mut self) -> u64 {
        let mut ports = Ports {
            hw: &mut self.hw,
            broker: &mut self.broker,
            storage: &mut self.store,
            clock: &self.clock,
            waiter: &mut self.waiter,
        };
        self.svc.run(&mut ports, &mut self.sink)
    }

    /// Payloads published on `topic`, oldest first.
    pub fn published_on(&self, topic: &str) -> Vec<String> {
        self.broker
            .published()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }
}
