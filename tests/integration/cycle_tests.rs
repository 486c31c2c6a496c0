//! Integration tests for one sampling cycle: sample → log → classify →
//! indicator → publish, against mock adapters.

use soilwatch::app::events::AppEvent;
use soilwatch::app::ports::{BrokerError, SensorError};
use soilwatch::app::service::CycleOutcome;
use soilwatch::classifier::{IndicatorColor, IrrigationZone, NOTIFY_CRITICAL, NOTIFY_WARNING};
use soilwatch::humidity_log::{HUMIDITY_LOG_KEY, HumidityLog};

use crate::mock_hw::{IndicatorCall, Rig};

fn completed(outcome: CycleOutcome) -> soilwatch::app::events::CycleReport {
    match outcome {
        CycleOutcome::Completed(r) => r,
        other => panic!("expected a completed cycle, got {:?}", other),
    }
}

// ── Scenario 1: steady at the lower threshold ────────────────

#[test]
fn steady_reading_at_min_is_critical_and_not_logged() {
    let mut rig = Rig::new();
    rig.hw.push_percent(30);
    rig.hw.push_percent(30);

    completed(rig.cycle()); // previous = 30.0
    let report = completed(rig.cycle());

    assert_eq!(report.percent, 30.0);
    assert_eq!(report.zone, IrrigationZone::Critical);
    assert_eq!(report.color.hex(), "#FF0000");
    assert!(!report.logged, "30 is not more than 30 + 2");

    let t = rig.topics.clone();
    assert_eq!(rig.published_on(&t.indicator_color), vec!["#FF0000"; 2]);
    assert_eq!(rig.published_on(&t.humidity), vec!["30.0"; 2]);
    assert_eq!(rig.published_on(&t.notification), vec![NOTIFY_CRITICAL; 2]);
}

// ── Scenario 2: watering event in the warning zone ───────────

#[test]
fn rise_is_logged_and_warning_published() {
    let mut rig = Rig::new();
    rig.hw.push_percent(20);
    rig.hw.push_percent(50);

    completed(rig.cycle());
    let report = completed(rig.cycle());

    assert!(report.logged, "50 > 20 + 2");
    assert_eq!(report.zone, IrrigationZone::Warning);
    assert_eq!(report.color, IndicatorColor::Yellow);

    let t = rig.topics.clone();
    assert_eq!(rig.published_on(&t.indicator_color).last().unwrap(), "#FFFF00");
    assert_eq!(rig.published_on(&t.notification).last().unwrap(), NOTIFY_WARNING);

    let dump = HumidityLog::read_entries(&rig.store);
    assert_eq!(dump.skipped, 0);
    assert_eq!(dump.entries.len(), 2);
    assert_eq!(dump.entries[1].percent, 50.0);
}

// ── Scenario 3: well watered ─────────────────────────────────

#[test]
fn wet_soil_is_ok_and_clears_notification() {
    let mut rig = Rig::new();
    rig.hw.push_percent(80);

    let report = completed(rig.cycle());

    assert_eq!(report.zone, IrrigationZone::Ok);
    assert_eq!(report.color.hex(), "#00FF00");
    let t = rig.topics.clone();
    assert_eq!(rig.published_on(&t.notification), vec!["-"]);
}

#[test]
fn publishes_in_fixed_order() {
    let mut rig = Rig::new();
    rig.hw.push_percent(80);
    completed(rig.cycle());

    let topics: Vec<&str> = rig.broker.published().iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(
        topics,
        vec![
            "tester/feeds/rgb-led",
            "tester/feeds/module-humidity",
            "tester/feeds/notification-msg",
        ]
    );
}

// ── Indicator ────────────────────────────────────────────────

#[test]
fn boot_blue_then_off_before_every_colour() {
    let mut rig = Rig::new();
    rig.hw.push_percent(80);
    rig.hw.push_percent(10);
    completed(rig.cycle());
    completed(rig.cycle());

    assert_eq!(
        rig.hw.calls,
        vec![
            IndicatorCall::Off,
            IndicatorCall::On(IndicatorColor::Blue),
            IndicatorCall::Off,
            IndicatorCall::On(IndicatorColor::Green),
            IndicatorCall::Off,
            IndicatorCall::On(IndicatorColor::Red),
        ]
    );
}

// ── Change suppression ───────────────────────────────────────

#[test]
fn falling_readings_are_never_logged() {
    let mut rig = Rig::new();
    for p in [60, 55, 40, 39, 10] {
        rig.hw.push_percent(p);
    }
    for _ in 0..5 {
        completed(rig.cycle());
    }
    // Only the first reading beats the 0.0 boot baseline.
    assert_eq!(HumidityLog::read_entries(&rig.store).entries.len(), 1);
    assert_eq!(rig.svc.last_humidity(), 10.0);
}

#[test]
fn baseline_moves_even_when_nothing_is_logged() {
    let mut rig = Rig::new();
    rig.hw.push_percent(50);
    rig.hw.push_percent(51);
    rig.hw.push_percent(53);

    assert!(completed(rig.cycle()).logged);
    assert!(!completed(rig.cycle()).logged);
    // 53 is not above 51 + 2; against a stale 50 it would have been.
    assert!(!completed(rig.cycle()).logged);
}

// ── Degraded paths ───────────────────────────────────────────

#[test]
fn sensor_failure_skips_cycle_without_touching_state() {
    let mut rig = Rig::new();
    rig.hw.push_percent(40);
    rig.hw.push_failure(263);

    completed(rig.cycle());
    let published_before = rig.broker.published().len();
    let calls_before = rig.hw.calls.len();

    assert_eq!(
        rig.cycle(),
        CycleOutcome::SensorFailed(SensorError::AdcReadFailed(263))
    );
    assert_eq!(rig.broker.published().len(), published_before);
    assert_eq!(rig.hw.calls.len(), calls_before);
    assert_eq!(rig.svc.last_humidity(), 40.0);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SensorFailed(_))), 1);
}

#[test]
fn one_failed_publish_does_not_stop_the_others() {
    let mut rig = Rig::new();
    let humidity_topic = rig.topics.humidity.clone();
    rig.broker.reject_publish_on(humidity_topic.clone());
    rig.hw.push_percent(80);

    let report = completed(rig.cycle());

    assert_eq!(report.publish_failures, 1);
    assert_eq!(rig.broker.published().len(), 2);
    assert!(rig.sink.events.contains(&AppEvent::PublishFailed {
        topic: humidity_topic,
        error: BrokerError::PublishFailed,
    }));
}

#[test]
fn log_write_failure_is_reported_and_cycle_completes() {
    let mut rig = Rig::new();
    rig.store.set_read_only(true);
    rig.hw.push_percent(60);

    let report = completed(rig.cycle());

    assert!(!report.logged);
    assert_eq!(rig.broker.published().len(), 3);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::StorageFailed { key, .. } if *key == HUMIDITY_LOG_KEY
    )));
}

#[test]
fn torn_log_entry_survives_restart() {
    let mut rig = Rig::new();
    rig.hw.push_percent(40);
    rig.hw.push_percent(70);
    completed(rig.cycle());
    // Power lost between the timestamp and value appends.
    rig.store.fail_appends_after(1);
    completed(rig.cycle());

    let dump = soilwatch::app::service::MonitorService::dump_log(&rig.store);
    assert_eq!(dump.entries.len(), 1);
    assert_eq!(dump.entries[0].percent, 40.0);
    assert_eq!(dump.skipped, 1);
}

#[test]
fn timestamps_come_from_the_clock() {
    let mut rig = Rig::new();
    rig.hw.push_percent(40);
    completed(rig.cycle());
    assert!(rig.sink.events.contains(&AppEvent::HumidityLogged {
        timestamp: "2024-05-01T09:00:00".into(),
        percent: 40.0,
    }));
    let raw = rig.store_raw_log();
    assert_eq!(raw, "2024-05-01T09:00:00\n40.0\n");
}

impl Rig {
    fn store_raw_log(&self) -> String {
        use soilwatch::app::ports::StoragePort;
        String::from_utf8(self.store.read(HUMIDITY_LOG_KEY).unwrap()).unwrap()
    }
}
