//! Assertion utilities for testing.
//!
//! Floating-point comparisons used across the integration tests.

/// Default epsilon for floating-point comparisons
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Assert that two floating-point values are approximately equal.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than `epsilon`.
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

/// Assert that two optional series agree element-wise, with missing
/// entries in the same places.
pub fn assert_series_approx_eq(actual: &[Option<f64>], expected: &[Option<f64>], epsilon: Option<f64>) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Series have different lengths: actual = {}, expected = {}",
        actual.len(),
        expected.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        match (a, e) {
            (Some(a), Some(e)) => {
                let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
                assert!(
                    (a - e).abs() <= eps,
                    "Series differ at index {}: actual = {}, expected = {}",
                    i,
                    a,
                    e
                );
            }
            (None, None) => {}
            _ => panic!("Series differ at index {}: actual = {:?}, expected = {:?}", i, a, e),
        }
    }
}

/// Assert that a value is within expected bounds (inclusive).
pub fn assert_in_range(actual: f64, min: f64, max: f64) {
    assert!(
        actual >= min && actual <= max,
        "Value not in range: actual = {}, min = {}, max = {}",
        actual,
        min,
        max
    );
}
