//! Signal processing: sliding windows, window features and calibration

mod calibration;
mod features;
mod window;

pub use calibration::{CalibrationError, Calibrator};
pub use features::{axis_features, extract, max_abs, mean, pairwise_sum, population_std, rms};
pub use window::{AxisWindows, WindowBuffer, WindowView};

use thiserror::Error;

/// Errors in processing setup
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("Invalid window geometry: size {size}, step {step} (need 0 < step <= size)")]
    InvalidWindow { size: usize, step: usize },
}
