//! Shared data structures for the accelerometer monitoring pipeline
//!
//! Data flows one way through these types:
//! - Acquisition: `RawTriple` (decoded line) -> `Sample` (bias corrected)
//! - Processing: per-axis windows -> `AxisFeatures` -> `FeatureVector`
//! - Classification: `FeatureVector` -> `ClassLabel`
//! - Action: `ClassLabel` -> `StateEntry` (command code + operator label)

mod sample;
mod features;
mod state;

pub use sample::*;
pub use features::*;
pub use state::*;
