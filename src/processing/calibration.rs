//! Zero-offset calibration
//!
//! Averages the first `k` valid readings of a live source into a per-axis
//! [`Bias`]. Malformed lines and read timeouts are skipped without limit.
//! A transport error is retried once; two in a row abort the run. On any
//! failure the caller keeps whatever bias it had before.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::acquisition::{parse_triple, LineEvent, LineSource, ParseOutcome, TransportError};
use crate::types::Bias;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Calibration needs at least one sample")]
    InvalidSampleCount,

    #[error("Source ended after {gathered} of {needed} calibration samples")]
    Insufficient { needed: usize, gathered: usize },

    #[error("Transport failed during calibration: {0}")]
    Transport(#[from] TransportError),

    #[error("Calibration cancelled")]
    Cancelled,
}

/// Computes a [`Bias`] from a batch of readings.
#[derive(Debug, Clone, Copy)]
pub struct Calibrator {
    samples: usize,
}

impl Calibrator {
    pub const fn new(samples: usize) -> Self {
        Self { samples }
    }

    pub const fn samples(&self) -> usize {
        self.samples
    }

    /// Read `samples` valid triples and return their component-wise mean.
    pub async fn run<S>(&self, source: &mut S, cancel: &CancellationToken) -> Result<Bias, CalibrationError>
    where
        S: LineSource + ?Sized,
    {
        if self.samples == 0 {
            return Err(CalibrationError::InvalidSampleCount);
        }

        let mut sum = [0.0_f64; 3];
        let mut gathered = 0usize;
        let mut skipped = 0usize;
        let mut retried = false;

        while gathered < self.samples {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(CalibrationError::Cancelled),
                event = source.next_line() => event,
            };

            let line = match event {
                Ok(LineEvent::Line(line)) => {
                    retried = false;
                    line
                }
                Ok(LineEvent::TimedOut) => {
                    skipped += 1;
                    debug!(source = source.source_name(), "Calibration read timed out");
                    continue;
                }
                Ok(LineEvent::Eof) => {
                    return Err(CalibrationError::Insufficient {
                        needed: self.samples,
                        gathered,
                    });
                }
                Err(e) if !retried => {
                    warn!(error = %e, "Transport error during calibration, retrying once");
                    retried = true;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match parse_triple(&line) {
                ParseOutcome::Sample(raw) => {
                    sum[0] += raw.x;
                    sum[1] += raw.y;
                    sum[2] += raw.z;
                    gathered += 1;
                }
                ParseOutcome::Skip(reason) => {
                    skipped += 1;
                    debug!(%reason, "Skipping line during calibration");
                }
            }
        }

        let k = self.samples as f64;
        let bias = Bias::new(sum[0] / k, sum[1] / k, sum[2] / k);
        info!(samples = gathered, skipped, bias = %bias, "Calibration complete");
        Ok(bias)
    }
}
