//! On-disk state shared between CLI invocations

mod bias_state;

pub use bias_state::{load_bias, load_bias_or, save_bias, BiasOrigin, BiasRecord, StateFileError};
