use std::time::Duration;

/// Exponential reconnect delay: `initial`, `2 * initial`, ... for at most
/// `max_attempts` consecutive failures.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max_attempts: u32,
    failures: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            max_attempts,
            failures: 0,
        }
    }

    /// Registers a failed attempt and returns how long to wait before the next one.
    pub fn record_failure(&mut self) -> Duration {
        let shift = self.failures.min(16);
        self.failures = self.failures.saturating_add(1);
        self.initial.saturating_mul(1u32 << shift)
    }

    pub fn exhausted(&self) -> bool {
        self.failures >= self.max_attempts
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_from_initial() {
        let mut backoff = Backoff::new(Duration::from_millis(500), 5);
        let delays: Vec<u64> = (0..5)
            .map(|_| backoff.record_failure().as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000, 8000]);
        assert!(backoff.exhausted());
    }

    #[test]
    fn test_not_exhausted_before_ceiling() {
        let mut backoff = Backoff::new(Duration::from_millis(10), 3);
        backoff.record_failure();
        backoff.record_failure();
        assert!(!backoff.exhausted());
        assert_eq!(backoff.failures(), 2);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut backoff = Backoff::new(Duration::from_millis(500), 5);
        backoff.record_failure();
        backoff.record_failure();
        backoff.reset();
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.record_failure(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_attempts_is_immediately_exhausted() {
        let backoff = Backoff::new(Duration::from_millis(500), 0);
        assert!(backoff.exhausted());
        assert_eq!(backoff.max_attempts(), 0);
    }
}
