//! Inter-request delay policy.
//!
//! Pacing between sequential fetches uses either a fixed base delay with
//! ±25% jitter or a caller-specified uniform range. Jitter keeps request
//! timing from forming a detectable fixed cadence.

use std::time::Duration;

use rand::Rng;

/// Default base delay between requests, in seconds.
pub const DEFAULT_BASE_DELAY_SECS: f64 = 5.0;

/// Jitter applied around a fixed base delay (fraction of the base).
const FIXED_JITTER_FRACTION: f64 = 0.25;

/// Policy choosing the pause before each request after the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayPolicy {
    /// Base duration ±25% uniform jitter.
    Fixed {
        /// The base delay.
        base: Duration,
    },
    /// Uniform duration in `[min, max]`.
    Range {
        /// Lower bound.
        min: Duration,
        /// Upper bound (inclusive).
        max: Duration,
    },
}

impl DelayPolicy {
    /// Creates a fixed-base policy.
    #[must_use]
    pub fn fixed(base: Duration) -> Self {
        Self::Fixed { base }
    }

    /// Creates a uniform-range policy; swapped bounds are reordered.
    #[must_use]
    pub fn range(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self::Range { min, max }
        } else {
            Self::Range { min: max, max: min }
        }
    }

    /// Samples the next delay.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        let mut rng = rand::thread_rng();
        let secs = match self {
            Self::Fixed { base } => {
                let base = base.as_secs_f64();
                let spread = base * FIXED_JITTER_FRACTION;
                if spread > 0.0 {
                    rng.gen_range(base - spread..=base + spread)
                } else {
                    base
                }
            }
            Self::Range { min, max } => {
                let (min, max) = (min.as_secs_f64(), max.as_secs_f64());
                if max > min {
                    rng.gen_range(min..=max)
                } else {
                    min
                }
            }
        };
        Duration::from_secs_f64(secs.max(0.0))
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs_f64(DEFAULT_BASE_DELAY_SECS))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_stays_within_jitter_bounds() {
        let policy = DelayPolicy::fixed(Duration::from_secs(4));
        for _ in 0..200 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_secs(3), "delay too short: {delay:?}");
            assert!(delay <= Duration::from_secs(5), "delay too long: {delay:?}");
        }
    }

    #[test]
    fn test_fixed_zero_base_yields_zero() {
        let policy = DelayPolicy::fixed(Duration::ZERO);
        assert_eq!(policy.next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_range_delay_stays_within_bounds() {
        let policy = DelayPolicy::range(Duration::from_secs(1), Duration::from_secs(2));
        for _ in 0..200 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_secs(2));
        }
    }

    #[test]
    fn test_range_swapped_bounds_reordered() {
        let policy = DelayPolicy::range(Duration::from_secs(3), Duration::from_secs(1));
        assert_eq!(
            policy,
            DelayPolicy::Range {
                min: Duration::from_secs(1),
                max: Duration::from_secs(3),
            }
        );
    }

    #[test]
    fn test_degenerate_range_yields_bound() {
        let policy = DelayPolicy::range(Duration::from_secs(2), Duration::from_secs(2));
        assert_eq!(policy.next_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_default_policy_is_fixed_five_seconds() {
        assert_eq!(
            DelayPolicy::default(),
            DelayPolicy::fixed(Duration::from_secs(5))
        );
    }
}
