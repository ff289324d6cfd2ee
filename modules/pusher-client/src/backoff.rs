use std::time::Duration;

/// Reconnect delay policy: `first × factor^attempt`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub first: Duration,
    pub max: Duration,
    pub factor: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(60),
            factor: 2.0,
        }
    }
}

impl Backoff {
    /// Delay before reconnect attempt `attempt` (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_uses_first_delay() {
        assert_eq!(Backoff::default().delay(0), Duration::from_secs(1));
    }

    #[test]
    fn delay_doubles() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
    }

    #[test]
    fn delay_is_capped() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(6), Duration::from_secs(60));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn unit_factor_is_constant() {
        let backoff = Backoff {
            first: Duration::from_millis(250),
            max: Duration::from_secs(5),
            factor: 1.0,
        };
        assert_eq!(backoff.delay(0), backoff.delay(10));
    }
}
