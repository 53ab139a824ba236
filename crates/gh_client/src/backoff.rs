use std::time::Duration;

/// Exponential backoff with symmetric jitter around the capped delay.
/// `attempt` counts from zero for the first retry.
pub fn retry_delay(attempt: u32, base: Duration, max: Duration, jitter_frac: f32) -> Duration {
    let factor = 1u32.checked_shl(attempt.min(8)).unwrap_or(u32::MAX);
    let capped = base.saturating_mul(factor).min(max);
    if jitter_frac <= 0.0 {
        return capped;
    }

    let nanos = capped.as_nanos() as f64;
    let offset = nanos * f64::from(jitter_frac) * (fastrand::f64() * 2.0 - 1.0);
    Duration::from_nanos((nanos + offset).max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_and_respects_the_cap() {
        let base = Duration::from_millis(200);
        let max = Duration::from_secs(5);
        let first = retry_delay(0, base, max, 0.0);
        let fifth = retry_delay(4, base, max, 0.0);
        let huge = retry_delay(30, base, max, 0.0);
        assert!(first < fifth);
        assert_eq!(fifth, Duration::from_millis(3200));
        assert_eq!(huge, max);
    }

    #[test]
    fn jitter_stays_within_the_band() {
        let base = Duration::from_millis(1000);
        let max = Duration::from_secs(10);
        for _ in 0..100 {
            let delay = retry_delay(0, base, max, 0.5);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }
}
