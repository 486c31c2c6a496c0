//! Integration tests for inbound threshold updates arriving through the
//! broker and taking effect within the same cycle.

use soilwatch::adapters::mqtt::INBOUND_DEPTH;
use soilwatch::app::commands::PayloadError;
use soilwatch::app::events::AppEvent;
use soilwatch::app::ports::InboundMessage;
use soilwatch::app::service::CycleOutcome;
use soilwatch::classifier::IrrigationZone;
use soilwatch::config::PayloadPolicy;
use soilwatch::thresholds::{ThresholdKind, ThresholdStore};

use crate::mock_hw::{Rig, test_config};

fn zone(outcome: CycleOutcome) -> IrrigationZone {
    match outcome {
        CycleOutcome::Completed(r) => r.zone,
        other => panic!("expected a completed cycle, got {:?}", other),
    }
}

#[test]
fn min_update_is_visible_to_the_same_cycle() {
    let mut rig = Rig::new();
    // Broker must be connected for messages to be drained.
    rig.hw.push_percent(80);
    rig.cycle();

    let min_topic = rig.topics.min_threshold.clone();
    rig.broker.inject(InboundMessage::new(min_topic, "25.0"));
    rig.hw.push_percent(27);

    // 27 would be CRITICAL under the default min of 30.
    assert_eq!(zone(rig.cycle()), IrrigationZone::Warning);
    assert_eq!(rig.svc.thresholds().min_humidity, 25.0);
    assert_eq!(ThresholdStore::load(&rig.store).current().min_humidity, 25.0);
    assert!(rig.sink.events.contains(&AppEvent::ThresholdChanged {
        which: ThresholdKind::Min,
        old: 30.0,
        new: 25.0,
    }));
}

#[test]
fn first_cycle_applies_queued_update_after_connecting() {
    let mut rig = Rig::new();
    let max_topic = rig.topics.max_threshold.clone();
    rig.broker.inject(InboundMessage::new(max_topic, "40"));
    rig.hw.push_percent(36);

    // midpoint = 40 - (40 - 30) / 2 = 35, so 36 is OK.
    assert_eq!(zone(rig.cycle()), IrrigationZone::Ok);
    assert_eq!(rig.svc.thresholds().max_humidity, 40.0);
}

#[test]
fn update_survives_restart() {
    let mut rig = Rig::new();
    let min_topic = rig.topics.min_threshold.clone();
    rig.broker.inject(InboundMessage::new(min_topic, "42.5"));
    rig.hw.push_percent(60);
    rig.cycle();

    let rebooted = Rig::with_store(test_config(), rig.store);
    assert_eq!(rebooted.svc.thresholds().min_humidity, 42.5);
    assert_eq!(rebooted.svc.thresholds().max_humidity, 75.0);
}

#[test]
fn lenient_policy_coerces_garbage_to_zero() {
    let mut rig = Rig::new();
    let min_topic = rig.topics.min_threshold.clone();
    rig.broker.inject(InboundMessage::new(min_topic, "not a number"));
    rig.hw.push_percent(5);

    assert_eq!(zone(rig.cycle()), IrrigationZone::Warning);
    assert_eq!(rig.svc.thresholds().min_humidity, 0.0);
}

#[test]
fn strict_policy_rejects_garbage() {
    let mut rig = Rig::with_config(soilwatch::config::MonitorConfig {
        payload_policy: PayloadPolicy::Strict,
        ..test_config()
    });
    let min_topic = rig.topics.min_threshold.clone();
    rig.broker.inject(InboundMessage::new(min_topic.clone(), "12abc"));
    rig.hw.push_percent(5);

    assert_eq!(zone(rig.cycle()), IrrigationZone::Critical);
    assert_eq!(rig.svc.thresholds().min_humidity, 30.0);
    assert!(rig.sink.events.contains(&AppEvent::PayloadRejected {
        topic: min_topic,
        error: PayloadError::NotNumeric,
    }));
}

#[test]
fn unrelated_channels_are_ignored() {
    let mut rig = Rig::new();
    rig.broker.inject(InboundMessage::new("min_humidity", "10"));
    rig.broker.inject(InboundMessage::new("tester/feeds/rgb-led", "#000000"));
    rig.hw.push_percent(50);
    rig.cycle();

    assert_eq!(rig.svc.thresholds().min_humidity, 30.0);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::ThresholdChanged { .. })),
        0
    );
}

#[test]
fn inverted_pair_is_accepted_as_is() {
    let mut rig = Rig::new();
    let min_topic = rig.topics.min_threshold.clone();
    rig.broker.inject(InboundMessage::new(min_topic, "90"));
    rig.hw.push_percent(80);

    assert_eq!(zone(rig.cycle()), IrrigationZone::Critical);
    let t = rig.svc.thresholds();
    assert_eq!((t.min_humidity, t.max_humidity), (90.0, 75.0));
}

#[test]
fn updates_apply_in_arrival_order() {
    let mut rig = Rig::new();
    let min_topic = rig.topics.min_threshold.clone();
    for v in ["10", "20", "15"] {
        rig.broker.inject(InboundMessage::new(min_topic.clone(), v));
    }
    rig.hw.push_percent(50);
    rig.cycle();

    assert_eq!(rig.svc.thresholds().min_humidity, 15.0);
    assert_eq!(ThresholdStore::load(&rig.store).current().min_humidity, 15.0);
}

#[test]
fn burst_beyond_queue_depth_keeps_the_last_value() {
    let mut rig = Rig::new();
    let min_topic = rig.topics.min_threshold.clone();
    let burst = INBOUND_DEPTH + 1;
    for v in 1..=burst {
        rig.broker.inject(InboundMessage::new(min_topic.clone(), format!("{v}.0")));
    }
    rig.hw.push_percent(50);
    rig.cycle();

    let last = burst as f32;
    assert_eq!(rig.svc.thresholds().min_humidity, last);
    assert_eq!(ThresholdStore::load(&rig.store).current().min_humidity, last);
}
