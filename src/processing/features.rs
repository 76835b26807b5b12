//! Window feature extraction
//!
//! The classifier was trained on features computed with numpy, so the
//! arithmetic here follows numpy's evaluation order exactly:
//! - sums use numpy's pairwise summation (8-way unrolled blocks of up
//!   to 128 elements, recursive halving above that),
//! - `std` is two-pass: mean first, then the mean of squared deviations,
//!   with divisor `n` (`ddof = 0`),
//! - `rms` is `sqrt(mean(x * x))`,
//! - `max` is the largest absolute value.
//!
//! A different divisor or summation order shifts features by a few ULPs
//! to a few percent, which the classifier sees as drift.

use crate::types::{AxisFeatures, FeatureVector};

use super::window::WindowView;

/// Block size below which numpy stops splitting a sum.
const PAIRWISE_BLOCK: usize = 128;

/// Unroll width of numpy's pairwise kernel.
const UNROLL: usize = 8;

/// Sum with numpy's pairwise algorithm.
pub fn pairwise_sum(values: &[f64]) -> f64 {
    pairwise_sum_by(values, |v| v)
}

fn pairwise_sum_by(values: &[f64], f: impl Fn(f64) -> f64 + Copy) -> f64 {
    let n = values.len();
    if n < UNROLL {
        let mut res = 0.0;
        for &v in values {
            res += f(v);
        }
        res
    } else if n <= PAIRWISE_BLOCK {
        let mut r = [0.0_f64; UNROLL];
        for (slot, &v) in r.iter_mut().zip(&values[..UNROLL]) {
            *slot = f(v);
        }
        let whole = n - n % UNROLL;
        for chunk in values[UNROLL..whole].chunks_exact(UNROLL) {
            for (slot, &v) in r.iter_mut().zip(chunk) {
                *slot += f(v);
            }
        }
        let mut res = ((r[0] + r[1]) + (r[2] + r[3])) + ((r[4] + r[5]) + (r[6] + r[7]));
        for &v in &values[whole..] {
            res += f(v);
        }
        res
    } else {
        let mut half = n / 2;
        half -= half % UNROLL;
        pairwise_sum_by(&values[..half], f) + pairwise_sum_by(&values[half..], f)
    }
}

/// Arithmetic mean, `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    pairwise_sum(values) / values.len() as f64
}

/// Population standard deviation (divisor `n`).
pub fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let deviations: Vec<f64> = values.iter().map(|&v| v - m).collect();
    (pairwise_sum_by(&deviations, |d| d * d) / values.len() as f64).sqrt()
}

/// Root mean square.
pub fn rms(values: &[f64]) -> f64 {
    (pairwise_sum_by(values, |v| v * v) / values.len() as f64).sqrt()
}

/// Largest absolute value, `0.0` for an empty slice.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()))
}

/// Features of a single axis window.
pub fn axis_features(window: &[f64]) -> AxisFeatures {
    AxisFeatures {
        max: max_abs(window),
        std: population_std(window),
        rms: rms(window),
    }
}

/// Full 9-field vector for a completed window.
pub fn extract(window: &WindowView<'_>) -> FeatureVector {
    FeatureVector::new(
        axis_features(window.x),
        axis_features(window.y),
        axis_features(window.z),
    )
}
