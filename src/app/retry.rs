//! Broker reconnect retry policy.
//!
//! Delay after the n-th failed attempt is
//! `min(initial * multiplier^(n-1), cap)`. The compiled default is a fixed
//! 5 s delay with no attempt limit, so the service blocks until the broker
//! is reachable again.

use core::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt (seconds)
    pub initial_delay_secs: u32,
    /// Upper bound on any single delay (seconds)
    pub max_delay_secs: u32,
    /// Growth factor between consecutive delays; 1 keeps the delay fixed
    pub multiplier: u32,
    /// Give up after this many failed attempts; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_secs: 5,
            max_delay_secs: 5,
            multiplier: 1,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that waits `secs` between attempts and never gives up.
    pub const fn fixed(secs: u32) -> Self {
        Self {
            initial_delay_secs: secs,
            max_delay_secs: secs,
            multiplier: 1,
            max_attempts: None,
        }
    }

    /// Backoff to apply after failed attempt number `attempt` (1-based).
    ///
    /// Returns `None` once the attempt limit is reached.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| attempt >= max) {
            return None;
        }
        let growth = self
            .multiplier
            .max(1)
            .saturating_pow(attempt.saturating_sub(1));
        let secs = self
            .initial_delay_secs
            .saturating_mul(growth)
            .min(self.max_delay_secs.max(self.initial_delay_secs));
        Some(Duration::from_secs(u64::from(secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fixed_five_seconds_forever() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_for(1), Some(Duration::from_secs(5)));
        assert_eq!(p.delay_for(1_000), Some(Duration::from_secs(5)));
        assert_eq!(p.delay_for(u32::MAX), Some(Duration::from_secs(5)));
    }

    #[test]
    fn exponential_growth_is_capped() {
        let p = RetryPolicy {
            initial_delay_secs: 2,
            max_delay_secs: 60,
            multiplier: 2,
            max_attempts: None,
        };
        assert_eq!(p.delay_for(1), Some(Duration::from_secs(2)));
        assert_eq!(p.delay_for(2), Some(Duration::from_secs(4)));
        assert_eq!(p.delay_for(5), Some(Duration::from_secs(32)));
        assert_eq!(p.delay_for(6), Some(Duration::from_secs(60)));
        assert_eq!(p.delay_for(40), Some(Duration::from_secs(60)));
    }

    #[test]
    fn bounded_policy_gives_up() {
        let p = RetryPolicy {
            max_attempts: Some(3),
            ..RetryPolicy::fixed(1)
        };
        assert!(p.delay_for(2).is_some());
        assert_eq!(p.delay_for(3), None);
    }

    #[test]
    fn zero_multiplier_behaves_as_fixed() {
        let p = RetryPolicy {
            multiplier: 0,
            ..RetryPolicy::fixed(7)
        };
        assert_eq!(p.delay_for(4), Some(Duration::from_secs(7)));
    }
}
