//! Window summary statistics fed to the classifier

use serde::{Deserialize, Serialize};

/// Number of features per axis (max, std, rms).
pub const FEATURES_PER_AXIS: usize = 3;

/// Total feature count across the three axes.
pub const FEATURE_COUNT: usize = FEATURES_PER_AXIS * 3;

/// Feature field names in the order the classifier was trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "max_x", "std_x", "rms_x", "max_y", "std_y", "rms_y", "max_z", "std_z", "rms_z",
];

/// Statistics for one axis window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisFeatures {
    /// Maximum absolute value
    pub max: f64,
    /// Population standard deviation (divisor = window length)
    pub std: f64,
    /// Root mean square
    pub rms: f64,
}

/// The 9-field vector for one completed window.
///
/// Only ever built from three fully computed axes, so a partial vector
/// cannot reach the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    pub x: AxisFeatures,
    pub y: AxisFeatures,
    pub z: AxisFeatures,
}

impl FeatureVector {
    pub const fn new(x: AxisFeatures, y: AxisFeatures, z: AxisFeatures) -> Self {
        Self { x, y, z }
    }

    /// Values in `FEATURE_NAMES` order.
    pub const fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.x.max, self.x.std, self.x.rms,
            self.y.max, self.y.std, self.y.rms,
            self.z.max, self.z.std, self.z.rms,
        ]
    }

    /// `(name, value)` pairs in training order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.to_array())
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}
