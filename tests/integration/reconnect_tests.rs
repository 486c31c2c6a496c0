//! Integration tests for broker session recovery and loop termination.

use std::time::Duration;

use soilwatch::app::events::AppEvent;
use soilwatch::app::retry::RetryPolicy;
use soilwatch::app::service::{CycleAbort, CycleOutcome};
use soilwatch::config::MonitorConfig;

use crate::mock_hw::{Rig, test_config};

const FIVE_SECS: Duration = Duration::from_secs(5);

#[test]
fn retries_every_five_seconds_until_connected() {
    let mut rig = Rig::new();
    rig.broker.fail_next_connects(3);
    rig.hw.push_percent(60);

    assert!(matches!(rig.cycle(), CycleOutcome::Completed(_)));
    assert_eq!(rig.waiter.waits, vec![FIVE_SECS; 3]);
    assert_eq!(rig.broker.connect_attempts(), 4);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::BrokerReconnected { attempts: 4 }));
    assert_eq!(rig.broker.published().len(), 3);
}

#[test]
fn live_session_is_not_reconnected() {
    let mut rig = Rig::new();
    rig.hw.push_percent(60);
    rig.hw.push_percent(61);
    rig.cycle();
    rig.cycle();

    assert_eq!(rig.broker.connect_attempts(), 1);
    assert!(rig.waiter.waits.is_empty());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::BrokerReconnected { .. })),
        1
    );
}

#[test]
fn dropped_session_resubscribes() {
    let mut rig = Rig::new();
    rig.hw.push_percent(60);
    rig.cycle();
    rig.broker.drop_connection();
    rig.hw.push_percent(60);
    rig.cycle();

    let expected = [
        rig.topics.min_threshold.clone(),
        rig.topics.max_threshold.clone(),
    ];
    assert_eq!(rig.broker.subscriptions().len(), 4);
    assert_eq!(&rig.broker.subscriptions()[2..], &expected);
    assert_eq!(rig.broker.connect_attempts(), 2);
}

#[test]
fn interrupt_during_backoff_skips_the_cycle() {
    let mut rig = Rig::new();
    rig.broker.fail_next_connects(10);
    rig.waiter.interrupt_at = Some(2);
    rig.hw.push_percent(60);

    assert_eq!(rig.cycle(), CycleOutcome::Aborted(CycleAbort::Interrupted));
    assert_eq!(rig.hw.reads, 0);
    assert!(rig.broker.published().is_empty());
    assert_eq!(rig.broker.connect_attempts(), 2);
    assert_eq!(rig.svc.cycle_count(), 1);
}

#[test]
fn bounded_policy_runs_the_cycle_offline() {
    let mut rig = Rig::with_config(MonitorConfig {
        reconnect: RetryPolicy {
            max_attempts: Some(2),
            ..RetryPolicy::fixed(5)
        },
        ..test_config()
    });
    rig.broker.fail_next_connects(10);
    rig.hw.push_percent(20);

    match rig.cycle() {
        CycleOutcome::Completed(report) => {
            assert_eq!(report.publish_failures, 3);
            assert!(report.logged);
        }
        other => panic!("expected an offline cycle, got {:?}", other),
    }
    assert_eq!(rig.waiter.waits, vec![FIVE_SECS]);
    assert!(rig.broker.published().is_empty());
    assert_eq!(rig.svc.last_humidity(), 20.0);
}

#[test]
fn run_waits_the_sample_interval_until_interrupted() {
    let mut rig = Rig::new();
    for p in [40, 45, 50] {
        rig.hw.push_percent(p);
    }
    rig.waiter.interrupt_at = Some(3);

    assert_eq!(rig.run(), 3);
    assert_eq!(rig.waiter.waits, vec![Duration::from_secs(300); 3]);
    assert_eq!(rig.hw.reads, 3);
    assert_eq!(rig.svc.entries_logged(), 3);
}

#[test]
fn run_stops_when_reconnect_is_interrupted() {
    let mut rig = Rig::new();
    rig.hw.push_percent(40);
    rig.cycle();

    rig.broker.drop_connection();
    rig.broker.fail_next_connects(5);
    rig.waiter.interrupt_at = Some(2);
    rig.hw.push_percent(45);

    // The aborted cycle still counts as started.
    assert_eq!(rig.run(), 1);
    assert_eq!(rig.svc.cycle_count(), 2);
    assert_eq!(rig.waiter.waits, vec![FIVE_SECS; 2]);
    assert_eq!(rig.hw.reads, 1);
}
