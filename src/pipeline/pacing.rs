use rand::Rng;
use std::time::Duration;

/// Longest pause accepted between two page fetches
pub const MAX_PACE_SECONDS: f64 = 3600.0;

/// Whether `[min_secs, max_secs]` is an acceptable pacing window
pub fn is_valid_window(min_secs: f64, max_secs: f64) -> bool {
    min_secs.is_finite()
        && max_secs.is_finite()
        && min_secs >= 0.0
        && max_secs >= min_secs
        && max_secs <= MAX_PACE_SECONDS
}

/// Chooses the pause taken between two page fetches
pub trait Pacer: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Uniformly random delay within `[min, max]`
#[derive(Debug, Clone)]
pub struct JitteredPacer {
    min: Duration,
    max: Duration,
}

impl JitteredPacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    /// Bounds are clamped into `[0, MAX_PACE_SECONDS]`; NaN counts as zero.
    pub fn from_secs_f64(min_secs: f64, max_secs: f64) -> Self {
        let clamp = |secs: f64| Duration::from_secs_f64(secs.max(0.0).min(MAX_PACE_SECONDS));
        Self::new(clamp(min_secs), clamp(max_secs))
    }
}

impl Pacer for JitteredPacer {
    fn next_delay(&self) -> Duration {
        if self.max == self.min {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// No pause at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn next_delay(&self) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_stays_within_bounds() {
        let pacer = JitteredPacer::from_secs_f64(1.0, 3.0);
        for _ in 0..200 {
            let delay = pacer.next_delay();
            assert!(delay >= Duration::from_secs(1) && delay <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_swapped_bounds_are_normalized() {
        let pacer = JitteredPacer::new(Duration::from_millis(50), Duration::from_millis(10));
        let delay = pacer.next_delay();
        assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(50));
    }

    #[test]
    fn test_out_of_range_bounds_are_clamped() {
        let pacer = JitteredPacer::from_secs_f64(1e20, f64::INFINITY);
        assert_eq!(pacer.next_delay(), Duration::from_secs_f64(MAX_PACE_SECONDS));

        let pacer = JitteredPacer::from_secs_f64(f64::NAN, -5.0);
        assert_eq!(pacer.next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_window_validation() {
        assert!(is_valid_window(0.0, 0.0));
        assert!(is_valid_window(1.0, MAX_PACE_SECONDS));
        assert!(!is_valid_window(2.0, 1.0));
        assert!(!is_valid_window(-1.0, 1.0));
        assert!(!is_valid_window(1.0, 1e20));
        assert!(!is_valid_window(f64::NAN, 1.0));
    }

    #[test]
    fn test_fixed_window() {
        let pacer = JitteredPacer::from_secs_f64(2.0, 2.0);
        assert_eq!(pacer.next_delay(), Duration::from_secs(2));
        assert_eq!(NoPacing.next_delay(), Duration::ZERO);
    }
}
