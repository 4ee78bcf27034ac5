//! Retry backoff and interval jitter.

use std::time::Duration;

/// Exponential backoff for retryable evaluation failures.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// First retry delay.
    pub base: Duration,
    /// Delay ceiling.
    pub max: Duration,
    /// Jitter factor (0.0 to 1.0) applied on top of the computed delay.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(300),
            jitter: 0.1,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let delay = (self.base.as_millis() as f64 * 2.0_f64.powi(exp as i32))
            .min(self.max.as_millis() as f64);
        let jittered = delay + delay * self.jitter * jitter_fraction();
        Duration::from_millis(jittered as u64)
    }
}

/// Spread an interval by up to `jitter` to desynchronize gauge loops.
pub fn jittered(interval: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return interval;
    }
    interval + Duration::from_millis((jitter.as_millis() as f64 * jitter_fraction()) as u64)
}

/// Uniform sample in [0, 1) from a clock-seeded LCG.
fn jitter_fraction() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let mixed = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (mixed >> 11) as f64 / (1u64 << 53) as f64
}
