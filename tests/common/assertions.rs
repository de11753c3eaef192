//! Assertion utilities for testing.
//!
//! Helpers for floating-point comparisons and track-level invariants.

use passage::TrackPoint;

/// Default epsilon for floating-point comparisons
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Assert that two floating-point values are approximately equal.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than
/// `epsilon` (default 1e-6).
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: Option<f64>) {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    let diff = (actual - expected).abs();

    assert!(
        diff <= epsilon,
        "Values not approximately equal: actual = {}, expected = {}, diff = {}, epsilon = {}",
        actual,
        expected,
        diff,
        epsilon
    );
}

/// Assert that an optional sample value is present and approximately `expected`
pub fn assert_sampled(actual: Option<f64>, expected: f64, epsilon: Option<f64>) {
    match actual {
        Some(value) => assert_approx_eq(value, expected, epsilon),
        None => panic!("Expected a sampled value near {}, got none", expected),
    }
}

/// Assert that a result is within expected bounds (inclusive).
pub fn assert_in_range(actual: f64, min: f64, max: f64) {
    assert!(
        actual >= min && actual <= max,
        "Value not in range: actual = {}, min = {}, max = {}",
        actual,
        min,
        max
    );
}

/// Assert that track timestamps never go backwards
pub fn assert_times_non_decreasing(track: &[TrackPoint]) {
    for (i, pair) in track.windows(2).enumerate() {
        assert!(
            pair[0].time_utc <= pair[1].time_utc,
            "Track time goes backwards at index {}: {} then {}",
            i + 1,
            pair[0].time_utc,
            pair[1].time_utc
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.0, None);
        assert_approx_eq(1.0, 1.000_000_1, None);
        assert_approx_eq(1.0, 1.001, Some(0.01));
    }

    #[test]
    fn test_assert_in_range() {
        assert_in_range(5.0, 0.0, 10.0);
        assert_in_range(0.0, 0.0, 10.0);
        assert_in_range(10.0, 0.0, 10.0);
    }

    #[test]
    #[should_panic(expected = "got none")]
    fn test_assert_sampled_missing() {
        assert_sampled(None, 1.0, None);
    }
}
