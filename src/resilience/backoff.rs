//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Delay before the next attempt, after `attempts` have already failed.
///
/// Doubles from `base_delay_ms`, capped at `max_delay_ms`, plus up to 10%
/// jitter on top. Zero failed attempts means no wait.
pub fn delay_for(config: &RetryConfig, attempts: u32) -> Duration {
    if attempts == 0 {
        return Duration::ZERO;
    }

    let factor = 1u64.checked_shl(attempts - 1).unwrap_or(u64::MAX);
    let delay_ms = config
        .base_delay_ms
        .saturating_mul(factor)
        .min(config.max_delay_ms);
    let jitter_ms = rand::thread_rng().gen_range(0..=delay_ms / 10);

    Duration::from_millis(delay_ms.saturating_add(jitter_ms))
}
