//! Exponential backoff.

use std::time::Duration;

/// Delay before the attempt following `attempt_index` (zero based).
///
/// `base_ms * 2^attempt_index`, capped at `max_ms`.
pub fn calculate_backoff(attempt_index: u32, base_ms: u64, max_ms: u64) -> Duration {
    let factor = 2u64.saturating_pow(attempt_index);
    let delay_ms = base_ms.saturating_mul(factor);
    Duration::from_millis(delay_ms.min(max_ms))
}
