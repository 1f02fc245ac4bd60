//! Simulated time units.
//!
//! The engine never reads a wall clock. Every entry point takes `now` as
//! milliseconds since an arbitrary epoch chosen by the host.

/// Milliseconds since the host's epoch.
pub type Millis = u64;

/// Milliseconds per second.
pub const MILLIS_PER_SECOND: u64 = 1000;

/// Convert fractional seconds to whole milliseconds, rounding to nearest.
///
/// Negative or non-finite inputs collapse to zero so a computed duration can
/// never place an end time before its start time.
#[must_use]
pub fn secs_to_millis(secs: f64) -> Millis {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * MILLIS_PER_SECOND as f64).round() as Millis
}

/// Convert milliseconds to fractional seconds.
#[must_use]
pub fn millis_to_secs(ms: Millis) -> f64 {
    ms as f64 / MILLIS_PER_SECOND as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_to_millis_rounds() {
        assert_eq!(secs_to_millis(1.0), 1000);
        assert_eq!(secs_to_millis(0.0015), 2);
        assert_eq!(secs_to_millis(-5.0), 0);
        assert_eq!(secs_to_millis(f64::NAN), 0);
    }

    #[test]
    fn test_millis_to_secs() {
        assert!((millis_to_secs(1500) - 1.5).abs() < f64::EPSILON);
    }
}
