//! Monitor service — the hexagonal core.
//!
//! [`MonitorService`] owns the thresholds, the humidity log writer and the
//! last observed reading. All I/O flows through port traits injected at
//! call sites, making the entire cycle testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!  BrokerPort ◀──▶│     MonitorService      │
//! StoragePort ◀──▶│ thresholds · log · last │
//!   ClockPort ──▶ └────────────────────────┘ ──▶ IndicatorPort
//! ```
//!
//! One cycle runs strictly in this order:
//!
//! 1. ensure the broker session is live (blocking retry with backoff)
//! 2. drain inbound messages and apply threshold updates
//! 3. sample the sensor and convert to percent
//! 4. append to the humidity log if the reading rose enough
//! 5. classify and drive the indicator (off, then the new colour)
//! 6. publish colour, percent and notification
//! 7. remember the reading for the next cycle's log check
//!
//! [`MonitorService::run`] then waits the sample interval and repeats
//! until the wait is interrupted.

use core::time::Duration;

use log::{debug, info, warn};

use crate::classifier::{IndicatorColor, classify};
use crate::config::{MonitorConfig, PayloadPolicy, ThresholdConfig, TopicSet};
use crate::humidity_log::{HUMIDITY_LOG_KEY, HumidityLog, LogDump};
use crate::sensors::moisture::Calibration;
use crate::thresholds::{ThresholdKind, ThresholdStore};

use super::commands::{AppCommand, decode_inbound};
use super::events::{AppEvent, CycleReport};
use super::ports::{
    BrokerPort, ClockPort, EventSink, IndicatorPort, SensorError, SensorPort, StoragePort,
    WaitOutcome, WaitPort,
};
use super::retry::RetryPolicy;

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// Every driven adapter one cycle touches, borrowed for the call.
///
/// `hw` satisfies **both** [`SensorPort`] and [`IndicatorPort`], which
/// avoids a double mutable borrow of the board.
pub struct Ports<'a, H, B, S, C, W> {
    pub hw: &'a mut H,
    pub broker: &'a mut B,
    pub storage: &'a mut S,
    pub clock: &'a C,
    pub waiter: &'a mut W,
}

// ───────────────────────────────────────────────────────────────
// Outcomes
// ───────────────────────────────────────────────────────────────

/// Why a cycle stopped before sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAbort {
    /// A stop was requested during reconnect backoff.
    Interrupted,
    /// A bounded retry policy ran out of attempts.
    RetriesExhausted,
}

/// Result of one [`MonitorService::run_cycle`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// The sensor could not be read; nothing was logged or published.
    SensorFailed(SensorError),
    Aborted(CycleAbort),
}

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct MonitorService {
    thresholds: ThresholdStore,
    log: HumidityLog,
    /// Reading from the previous completed cycle; 0.0 at boot.
    last_humidity: f32,
    calibration: Calibration,
    topics: TopicSet,
    policy: PayloadPolicy,
    retry: RetryPolicy,
    clear_marker: String,
    sample_interval: Duration,
    cycle_count: u64,
}

impl MonitorService {
    /// Construct the service from configuration and the thresholds loaded
    /// at boot.
    pub fn new(config: &MonitorConfig, thresholds: ThresholdStore) -> Self {
        Self {
            thresholds,
            log: HumidityLog::new(),
            last_humidity: 0.0,
            calibration: config.calibration,
            topics: config.topics(),
            policy: config.payload_policy,
            retry: config.reconnect.clone(),
            clear_marker: config.clear_marker.clone(),
            sample_interval: Duration::from_secs(u64::from(config.sample_interval_secs)),
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Light the boot indicator and announce the loaded thresholds.
    ///
    /// Blue stays on until the first cycle classifies a reading.
    pub fn start(&mut self, hw: &mut impl IndicatorPort, sink: &mut impl EventSink) {
        hw.indicator_off();
        hw.indicator_on(IndicatorColor::Blue);
        let thresholds = self.thresholds.current();
        sink.emit(&AppEvent::Started { thresholds });
        info!(
            "MonitorService started (min={:.1} max={:.1} interval={}s)",
            thresholds.min_humidity,
            thresholds.max_humidity,
            self.sample_interval.as_secs()
        );
    }

    /// Write every stored log entry to the diagnostic log.
    pub fn dump_log(storage: &impl StoragePort) -> LogDump {
        let dump = HumidityLog::read_entries(storage);
        for entry in &dump.entries {
            info!("LOG | {} | {:.1}%", entry.timestamp, entry.percent);
        }
        info!(
            "LOG | {} entries, {} malformed lines skipped",
            dump.entries.len(),
            dump.skipped
        );
        dump
    }

    /// Run cycles back to back, waiting the sample interval between them,
    /// until a wait is interrupted. Returns the number of cycles run.
    pub fn run<H, B, S, C, W>(
        &mut self,
        ports: &mut Ports<'_, H, B, S, C, W>,
        sink: &mut impl EventSink,
    ) -> u64
    where
        H: SensorPort + IndicatorPort,
        B: BrokerPort,
        S: StoragePort,
        C: ClockPort,
        W: WaitPort,
    {
        let started_at = self.cycle_count;
        loop {
            if let CycleOutcome::Aborted(CycleAbort::Interrupted) = self.run_cycle(ports, sink) {
                break;
            }
            if ports.waiter.wait(self.sample_interval) == WaitOutcome::Interrupted {
                break;
            }
        }
        let ran = self.cycle_count - started_at;
        info!("MonitorService stopped after {} cycles", ran);
        ran
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full cycle: connect → inbound → sample → log → classify →
    /// indicator → publish.
    pub fn run_cycle<H, B, S, C, W>(
        &mut self,
        ports: &mut Ports<'_, H, B, S, C, W>,
        sink: &mut impl EventSink,
    ) -> CycleOutcome
    where
        H: SensorPort + IndicatorPort,
        B: BrokerPort,
        S: StoragePort,
        C: ClockPort,
        W: WaitPort,
    {
        self.cycle_count += 1;

        // 1. Broker session
        let online = match self.ensure_connected(ports.broker, ports.waiter, sink) {
            Ok(_) => true,
            Err(CycleAbort::Interrupted) => {
                return CycleOutcome::Aborted(CycleAbort::Interrupted);
            }
            Err(CycleAbort::RetriesExhausted) => false,
        };

        // 2. Inbound threshold updates, visible to this cycle's classify
        if online {
            self.drain_inbound(ports.broker, ports.storage, sink);
        }

        // 3. Sample
        let raw = match ports.hw.read_moisture_raw() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cycle {}: sensor read failed ({}), skipping", self.cycle_count, e);
                sink.emit(&AppEvent::SensorFailed(e));
                return CycleOutcome::SensorFailed(e);
            }
        };
        let percent = self.calibration.to_percent(raw);

        // 4. Change-suppressed log
        let logged = self.log_if_rising(ports.storage, ports.clock, percent, sink);

        // 5. Classify and drive the indicator
        let thresholds = self.thresholds.current();
        let class = classify(percent, &thresholds);
        ports.hw.indicator_off();
        ports.hw.indicator_on(class.color);

        // 6. Publish
        let notification = class.notification.unwrap_or(self.clear_marker.as_str());
        let humidity = format!("{:.1}", percent);
        let outbound = [
            (&self.topics.indicator_color, class.color.hex()),
            (&self.topics.humidity, humidity.as_str()),
            (&self.topics.notification, notification),
        ];
        let mut publish_failures = 0u8;
        for (topic, payload) in outbound {
            if !online {
                publish_failures += 1;
                continue;
            }
            if let Err(error) = ports.broker.publish(topic, payload) {
                warn!("Publish to {} failed ({})", topic, error);
                sink.emit(&AppEvent::PublishFailed {
                    topic: topic.clone(),
                    error,
                });
                publish_failures += 1;
            }
        }

        // 7. Remember for the next log check
        self.last_humidity = percent;

        let report = CycleReport {
            raw,
            percent,
            zone: class.zone,
            color: class.color,
            logged,
            thresholds,
            publish_failures,
        };
        sink.emit(&AppEvent::CycleCompleted(report));
        CycleOutcome::Completed(report)
    }

    /// Make sure the broker session is live, retrying per the reconnect
    /// policy. Returns the number of attempts made (0 if already
    /// connected).
    pub fn ensure_connected(
        &mut self,
        broker: &mut impl BrokerPort,
        waiter: &mut impl WaitPort,
        sink: &mut impl EventSink,
    ) -> Result<u32, CycleAbort> {
        if broker.is_connected() {
            return Ok(0);
        }
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match broker.connect() {
                Ok(()) => {
                    info!("Broker: connected after {} attempt(s)", attempt);
                    sink.emit(&AppEvent::BrokerReconnected { attempts: attempt });
                    return Ok(attempt);
                }
                Err(e) => {
                    let Some(delay) = self.retry.delay_for(attempt) else {
                        warn!("Broker: attempt {} failed ({}), giving up", attempt, e);
                        return Err(CycleAbort::RetriesExhausted);
                    };
                    warn!(
                        "Broker: attempt {} failed ({}), retrying in {}s",
                        attempt,
                        e,
                        delay.as_secs()
                    );
                    if waiter.wait(delay) == WaitOutcome::Interrupted {
                        info!("Broker: reconnect interrupted");
                        return Err(CycleAbort::Interrupted);
                    }
                }
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply one decoded inbound command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::SetThreshold { which, value } => {
                self.set_threshold(which, value, storage, sink);
            }
        }
    }

    fn set_threshold(
        &mut self,
        which: ThresholdKind,
        value: f32,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        let old = self.thresholds.get(which);
        let persisted = self.thresholds.update(storage, which, value);
        sink.emit(&AppEvent::ThresholdChanged {
            which,
            old,
            new: value,
        });
        if let Err(error) = persisted {
            warn!("Thresholds: {} not persisted ({})", which.key(), error);
            sink.emit(&AppEvent::StorageFailed {
                key: which.key(),
                error,
            });
        }
    }

    fn drain_inbound(
        &mut self,
        broker: &mut impl BrokerPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        while let Some(msg) = broker.poll_inbound() {
            match decode_inbound(&msg, &self.topics, self.policy) {
                Ok(Some(cmd)) => self.handle_command(cmd, storage, sink),
                Ok(None) => debug!("Inbound: ignoring message on {}", msg.topic),
                Err(error) => {
                    warn!("Inbound: rejected payload on {} ({})", msg.topic, error);
                    sink.emit(&AppEvent::PayloadRejected {
                        topic: msg.topic,
                        error,
                    });
                }
            }
        }
    }

    fn log_if_rising(
        &mut self,
        storage: &mut impl StoragePort,
        clock: &impl ClockPort,
        percent: f32,
        sink: &mut impl EventSink,
    ) -> bool {
        if !HumidityLog::should_log(percent, self.last_humidity) {
            return false;
        }
        let timestamp = clock.timestamp();
        match self
            .log
            .maybe_log(storage, percent, self.last_humidity, &timestamp)
        {
            Ok(logged) => {
                if logged {
                    sink.emit(&AppEvent::HumidityLogged { timestamp, percent });
                }
                logged
            }
            Err(error) => {
                warn!("HumidityLog: append failed ({})", error);
                sink.emit(&AppEvent::StorageFailed {
                    key: HUMIDITY_LOG_KEY,
                    error,
                });
                false
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn thresholds(&self) -> ThresholdConfig {
        self.thresholds.current()
    }

    /// Reading remembered from the last completed cycle.
    pub fn last_humidity(&self) -> f32 {
        self.last_humidity
    }

    /// Cycles started since boot, including skipped ones.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Humidity log entries written since boot.
    pub fn entries_logged(&self) -> u32 {
        self.log.written()
    }

    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }
}
