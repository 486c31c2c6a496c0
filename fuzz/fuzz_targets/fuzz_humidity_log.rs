//! Fuzz target: humidity log reader
//!
//! Feeds arbitrary bytes to the tolerant log parser, as if the flash
//! record had been torn or corrupted, and checks:
//! - No panics under arbitrary input
//! - Every non-blank line is accounted for, either in an entry or as skipped
//! - Every parsed value is finite
//!
//! cargo fuzz run fuzz_humidity_log

#![no_main]

use libfuzzer_sys::fuzz_target;
use soilwatch::humidity_log::HumidityLog;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let dump = HumidityLog::parse(&text);

    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    assert_eq!(
        dump.entries.len() * 2 + dump.skipped,
        lines,
        "parser lost track of a line"
    );
    assert!(dump.entries.iter().all(|e| e.percent.is_finite()));
});
