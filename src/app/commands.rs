//! Inbound commands to the monitor service.
//!
//! The broker adapter hands every received message to
//! [`decode_inbound`], which matches the full channel name against the
//! resolved [`TopicSet`] and turns a threshold payload into an
//! [`AppCommand`]. Messages on any other channel are ignored.

use core::fmt;

use crate::app::ports::InboundMessage;
use crate::config::{PayloadPolicy, TopicSet};
use crate::thresholds::ThresholdKind;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Replace one threshold and persist it.
    SetThreshold { which: ThresholdKind, value: f32 },
}

/// Why a threshold payload was rejected under [`PayloadPolicy::Strict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Payload bytes are not valid UTF-8.
    InvalidUtf8,
    /// Payload is not a finite decimal number.
    NotNumeric,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUtf8 => write!(f, "payload is not UTF-8"),
            Self::NotNumeric => write!(f, "payload is not a decimal number"),
        }
    }
}

/// Decode one inbound message.
///
/// Returns `Ok(None)` for channels that carry no command.
pub fn decode_inbound(
    msg: &InboundMessage,
    topics: &TopicSet,
    policy: PayloadPolicy,
) -> Result<Option<AppCommand>, PayloadError> {
    let which = if msg.topic == topics.min_threshold {
        ThresholdKind::Min
    } else if msg.topic == topics.max_threshold {
        ThresholdKind::Max
    } else {
        return Ok(None);
    };
    let value = parse_payload(&msg.payload, policy)?;
    Ok(Some(AppCommand::SetThreshold { which, value }))
}

/// Parse a threshold payload according to `policy`.
pub fn parse_payload(payload: &[u8], policy: PayloadPolicy) -> Result<f32, PayloadError> {
    match policy {
        PayloadPolicy::Lenient => Ok(parse_lenient(&String::from_utf8_lossy(payload))),
        PayloadPolicy::Strict => {
            let text = core::str::from_utf8(payload).map_err(|_| PayloadError::InvalidUtf8)?;
            parse_strict(text)
        }
    }
}

fn parse_strict(text: &str) -> Result<f32, PayloadError> {
    let text = text.trim();
    let is_decimal = !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !is_decimal {
        return Err(PayloadError::NotNumeric);
    }
    text.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(PayloadError::NotNumeric)
}

/// Longest leading decimal number, or `0.0` if there is none.
///
/// `"42.5%"` gives 42.5, `"abc"` gives 0.0.
fn parse_lenient(text: &str) -> f32 {
    let s = text.trim_start().as_bytes();
    let digits = |from: usize| s[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(matches!(s.first(), Some(b'+' | b'-')));
    let int_len = digits(end);
    end += int_len;
    let mut frac_len = 0;
    if s.get(end) == Some(&b'.') {
        frac_len = digits(end + 1);
        if int_len > 0 || frac_len > 0 {
            end += 1 + frac_len;
        }
    }
    if int_len == 0 && frac_len == 0 {
        return 0.0;
    }
    if matches!(s.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(s.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_len = digits(exp_end);
        if exp_len > 0 {
            end = exp_end + exp_len;
        }
    }

    core::str::from_utf8(&s[..end])
        .ok()
        .and_then(|t| t.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
