//! Sensor readings and calibration bias

use serde::{Deserialize, Serialize};

/// One decoded line from the sensor, before bias correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawTriple {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RawTriple {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A bias-corrected reading. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    x: f64,
    y: f64,
    z: f64,
}

impl Sample {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn x(&self) -> f64 {
        self.x
    }

    pub const fn y(&self) -> f64 {
        self.y
    }

    pub const fn z(&self) -> f64 {
        self.z
    }
}

/// Per-axis zero offset established by calibration.
///
/// Held constant for a session; replaced only by re-running calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bias {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Bias {
    pub const ZERO: Bias = Bias { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Subtract the bias componentwise.
    pub fn correct(&self, raw: RawTriple) -> Sample {
        Sample::new(raw.x - self.x, raw.y - self.y, raw.z - self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Bias {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl std::fmt::Display for Bias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}
