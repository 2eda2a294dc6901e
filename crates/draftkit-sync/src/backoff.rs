//! Reconnect delays for spectators that lose their connection.

use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Exponential backoff settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Upper bound for any single delay.
    pub max: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Random spread applied to each delay, as a fraction of it.
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(250),
            max: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl BackoffConfig {
    pub fn validated(mut self) -> Self {
        if self.initial.is_zero() {
            warn!("initial backoff is zero, using 1ms");
            self.initial = Duration::from_millis(1);
        }
        if self.max < self.initial {
            warn!(
                max_ms = self.max.as_millis() as u64,
                initial_ms = self.initial.as_millis() as u64,
                "max backoff below initial, raising it"
            );
            self.max = self.initial;
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            warn!(multiplier = self.multiplier, "backoff multiplier below 1, using 1");
            self.multiplier = 1.0;
        }
        if !self.jitter.is_finite() || !(0.0..=1.0).contains(&self.jitter) {
            warn!(jitter = self.jitter, "backoff jitter out of range, clamping");
            self.jitter = if self.jitter.is_finite() {
                self.jitter.clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
        self
    }
}

/// Tracks consecutive failed attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config: config.validated(),
            attempt: 0,
        }
    }

    /// Failed attempts since the last [`reset`](Self::reset).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The delay before the next retry. Advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let exp = self.config.multiplier.powi(self.attempt.min(32) as i32);
        let base = (self.config.initial.as_secs_f64() * exp).min(self.config.max.as_secs_f64());
        self.attempt = self.attempt.saturating_add(1);

        let spread = base * self.config.jitter;
        let jittered = if spread > 0.0 {
            base + rand::rng().random_range(-spread..=spread)
        } else {
            base
        };
        Duration::from_secs_f64(jittered.clamp(0.0, self.config.max.as_secs_f64()))
    }

    /// Call after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> BackoffConfig {
        BackoffConfig {
            jitter: 0.0,
            ..BackoffConfig::default()
        }
    }

    #[test]
    fn test_next_delay_doubles_until_max() {
        let mut backoff = Backoff::new(no_jitter());
        let delays: Vec<u128> = (0..8).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, [250, 500, 1000, 2000, 4000, 8000, 10000, 10000]);
        assert_eq!(backoff.attempt(), 8);
    }

    #[test]
    fn test_reset_starts_over() {
        let mut backoff = Backoff::new(no_jitter());
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_next_delay_jitter_stays_in_bounds() {
        let mut backoff = Backoff::default();
        for _ in 0..50 {
            let d = backoff.next_delay();
            assert!(d <= Duration::from_secs(10));
        }
        let mut fresh = Backoff::default();
        let first = fresh.next_delay();
        assert!(first >= Duration::from_millis(199) && first <= Duration::from_millis(301));
    }

    #[test]
    fn test_validated_fixes_inverted_bounds() {
        let config = BackoffConfig {
            initial: Duration::from_secs(5),
            max: Duration::from_secs(1),
            multiplier: 0.5,
            jitter: 3.0,
        }
        .validated();
        assert_eq!(config.max, Duration::from_secs(5));
        assert_eq!(config.multiplier, 1.0);
        assert_eq!(config.jitter, 1.0);
    }
}
