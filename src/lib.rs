//! accelmon: accelerometer stream monitor
//!
//! Reads 3-axis readings from a serial sensor board, classifies the
//! machine state from sliding-window vibration features and sends a
//! command back over the same link once a state is confirmed.
//!
//! ## Architecture
//!
//! - **Acquisition**: line link over serial, TCP bridge or stdio; line parser
//! - **Processing**: step-truncating windows, numpy-compatible features, calibration
//! - **Classifier**: `Classifier` trait with a JSON logistic-regression model
//! - **Pipeline**: debouncer, stream processor, dataset capture

pub mod acquisition;
pub mod classifier;
pub mod config;
pub mod pipeline;
pub mod processing;
pub mod sensors;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::MonitorConfig;

// Re-export commonly used types
pub use types::{Bias, ClassLabel, FeatureVector, Sample, StateTable};

// Re-export the seams modes depend on
pub use acquisition::{LineEvent, LineLink, LineSink, LineSource, TransportError};
pub use classifier::{Classifier, ClassifierError, LogisticModel};

// Re-export pipeline components
pub use pipeline::{AnalysisError, SessionStats, StateDebouncer, StreamProcessor};
pub use processing::{AxisWindows, CalibrationError, Calibrator, WindowBuffer};
