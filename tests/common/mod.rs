#![allow(dead_code)]

const ABS_TOL: f64 = 1e-14;
const REL_TOL: f64 = 1e-12;

pub fn assert_close(actual: f64, expected: f64) {
    let diff = (actual - expected).abs();
    let tol = ABS_TOL.max(REL_TOL * expected.abs());
    assert!(
        diff <= tol,
        "|{actual} - {expected}| = {diff} exceeds tolerance {tol}"
    );
}

pub fn assert_close_slice(actual: &[f64], expected: &[f64]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "vector lengths differ: {} vs {}",
        actual.len(),
        expected.len()
    );
    for (idx, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        let tol = ABS_TOL.max(REL_TOL * e.abs());
        assert!(
            diff <= tol,
            "index {idx}: |{a} - {e}| = {diff} exceeds tolerance {tol}"
        );
    }
}

/// Sample mean and unbiased sample variance.
pub fn mean_and_variance(samples: &[f64]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance)
}

pub fn assert_within(actual: f64, expected: f64, tolerance: f64, what: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{what}: {actual} is not within {tolerance} of {expected}"
    );
}
