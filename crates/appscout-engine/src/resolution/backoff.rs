use std::time::Duration;

/// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`,
/// optionally capped.
pub fn exponential_delay(attempt: u32, base: Duration, cap: Option<Duration>) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    let delay = base.saturating_mul(1u32 << exponent);
    match cap {
        Some(cap) => delay.min(cap),
        None => delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_millis(1000);
    const CAP: Duration = Duration::from_millis(5000);

    #[test]
    fn test_capped_schedule() {
        let delays: Vec<u128> = (1..=5)
            .map(|a| exponential_delay(a, SECOND, Some(CAP)).as_millis())
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000]);
    }

    #[test]
    fn test_uncapped_schedule() {
        let base = Duration::from_millis(500);
        let delays: Vec<u128> = (1..=4)
            .map(|a| exponential_delay(a, base, None).as_millis())
            .collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000]);
    }

    #[test]
    fn test_large_attempt_saturates() {
        let d = exponential_delay(u32::MAX, SECOND, None);
        assert!(d >= Duration::from_secs(1 << 30));
    }
}
