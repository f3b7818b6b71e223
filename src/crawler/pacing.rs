//! Pacing between navigations
//!
//! Listing sites rate-limit aggressively, so every navigation waits a
//! little first. The strategy is pluggable: production uses a random
//! human-like pause, tests swap in no pause at all.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// Decides how long to wait before the next navigation
pub trait DelayStrategy: Send + Sync {
    /// Returns the pause to take before the next request
    fn pause(&self) -> Duration;
}

/// Uniform random pause inside a configured window
pub struct HumanPacing {
    min: Duration,
    max: Duration,
}

impl HumanPacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.pause_min_ms),
            Duration::from_millis(config.pause_max_ms),
        )
    }
}

impl DelayStrategy for HumanPacing {
    fn pause(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let spread = (self.max - self.min).as_millis() as u64;
        self.min + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }
}

/// No pause at all, for tests and local fixtures
pub struct NoPacing;

impl DelayStrategy for NoPacing {
    fn pause(&self) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_stays_in_window() {
        let pacing = HumanPacing::new(Duration::from_millis(10), Duration::from_millis(50));
        for _ in 0..200 {
            let pause = pacing.pause();
            assert!(pause >= Duration::from_millis(10));
            assert!(pause <= Duration::from_millis(50));
        }
    }

    #[test]
    fn test_degenerate_window_returns_min() {
        let pacing = HumanPacing::new(Duration::from_millis(25), Duration::from_millis(25));
        assert_eq!(pacing.pause(), Duration::from_millis(25));
    }

    #[test]
    fn test_zero_window_is_silent() {
        let pacing = HumanPacing::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(pacing.pause(), Duration::ZERO);
    }

    #[test]
    fn test_no_pacing_never_waits() {
        assert_eq!(NoPacing.pause(), Duration::ZERO);
    }
}
