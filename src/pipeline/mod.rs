//! Operating modes over a line link
//!
//! ```text
//! line -> parse -> bias -> windows -> features -> classify -> debounce -> command
//! ```
//!
//! Each mode borrows the link for its whole duration. Modes never run
//! concurrently on the same transport.

mod capture;
mod debounce;
mod processor;

pub use capture::{record, CaptureError, CaptureRow, Dataset, DatasetFiles};
pub use debounce::StateDebouncer;
pub use processor::{AnalysisError, SessionStats, StreamProcessor, WindowReport};
