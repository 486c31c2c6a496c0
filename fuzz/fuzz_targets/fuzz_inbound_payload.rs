//! Fuzz target: inbound threshold messages
//!
//! The first byte picks the topic and policy, the rest is the payload.
//! Verifies that decoding never panics and that any accepted threshold
//! is a finite number.
//!
//! cargo fuzz run fuzz_inbound_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use soilwatch::app::commands::{AppCommand, decode_inbound};
use soilwatch::app::ports::InboundMessage;
use soilwatch::config::{MonitorConfig, PayloadPolicy};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };

    let topics = MonitorConfig::default().topics();
    let topic = match selector % 3 {
        0 => topics.min_threshold.clone(),
        1 => topics.max_threshold.clone(),
        _ => topics.humidity.clone(),
    };
    let policy = if selector & 0x80 == 0 {
        PayloadPolicy::Lenient
    } else {
        PayloadPolicy::Strict
    };

    let msg = InboundMessage::new(topic, payload);
    match decode_inbound(&msg, &topics, policy) {
        Ok(Some(AppCommand::SetThreshold { value, .. })) => assert!(value.is_finite()),
        Ok(None) => assert_eq!(selector % 3, 2),
        Err(_) => assert_eq!(policy, PayloadPolicy::Strict),
    }
});
