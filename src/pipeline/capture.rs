//! Dataset capture
//!
//! Records `n` bias-corrected readings with millisecond timestamps and
//! writes them as `<name>.csv` plus a `<name>_stats.txt` summary, the
//! layout the training notebook expects. Nothing is written unless all
//! `n` samples were gathered.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::acquisition::{parse_triple, LineEvent, LineSource, ParseOutcome, TransportError};
use crate::types::{Bias, Sample};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Transport failed during capture: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to write {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Capture cancelled")]
    Cancelled,
}

/// One recorded reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRow {
    /// Milliseconds since the first reading
    pub timestamp_ms: f64,
    pub sample: Sample,
}

/// A completed capture, ready to be written.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub rows: Vec<CaptureRow>,
    pub elapsed: Duration,
    pub bias: Bias,
}

/// Paths written by [`Dataset::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFiles {
    pub csv: PathBuf,
    pub stats: PathBuf,
}

/// Read `samples` valid readings from `source`.
///
/// A transport error is retried once; a second consecutive error, or the
/// end of the stream, aborts the capture.
pub async fn record<S>(
    source: &mut S,
    samples: usize,
    bias: Bias,
    cancel: &CancellationToken,
) -> Result<Dataset, CaptureError>
where
    S: LineSource + ?Sized,
{
    let mut rows = Vec::with_capacity(samples);
    let mut first: Option<Instant> = None;
    let started = Instant::now();
    let mut retried = false;

    while rows.len() < samples {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CaptureError::Cancelled),
            event = source.next_line() => event,
        };

        let line = match event {
            Ok(LineEvent::Line(line)) => {
                retried = false;
                line
            }
            Ok(LineEvent::TimedOut) => continue,
            Ok(LineEvent::Eof) => {
                warn!(gathered = rows.len(), samples, "Source ended before capture completed");
                return Err(TransportError::Closed.into());
            }
            Err(e) if !retried => {
                warn!(error = %e, "Transport error during capture, retrying once");
                retried = true;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let raw = match parse_triple(&line) {
            ParseOutcome::Sample(raw) => raw,
            ParseOutcome::Skip(reason) => {
                debug!(%reason, "Skipping line during capture");
                continue;
            }
        };

        let now = Instant::now();
        let origin = *first.get_or_insert(now);
        rows.push(CaptureRow {
            timestamp_ms: now.duration_since(origin).as_secs_f64() * 1000.0,
            sample: bias.correct(raw),
        });
    }

    let elapsed = started.elapsed();
    info!(samples = rows.len(), elapsed_ms = elapsed.as_millis() as u64, "Capture complete");
    Ok(Dataset { rows, elapsed, bias })
}

impl Dataset {
    pub fn to_csv(&self) -> String {
        let mut out = String::from("timestamp,x,y,z\n");
        for row in &self.rows {
            let s = row.sample;
            out.push_str(&format!("{},{},{},{}\n", row.timestamp_ms, s.x(), s.y(), s.z()));
        }
        out
    }

    pub fn stats_text(&self) -> String {
        format!(
            "Elapsed time: {} ms\nBias: {}\n",
            self.elapsed.as_nanos() as f64 / 1e6,
            self.bias
        )
    }

    /// Write `<name>.csv` and `<name>_stats.txt` into `dir`.
    pub fn write(&self, dir: &Path, name: &str) -> Result<DatasetFiles, CaptureError> {
        std::fs::create_dir_all(dir).map_err(|e| CaptureError::Io(dir.to_path_buf(), e))?;

        let files = DatasetFiles {
            csv: dir.join(format!("{name}.csv")),
            stats: dir.join(format!("{name}_stats.txt")),
        };
        std::fs::write(&files.stats, self.stats_text())
            .map_err(|e| CaptureError::Io(files.stats.clone(), e))?;
        std::fs::write(&files.csv, self.to_csv())
            .map_err(|e| CaptureError::Io(files.csv.clone(), e))?;

        info!(csv = %files.csv.display(), rows = self.rows.len(), "Dataset written");
        Ok(files)
    }
}
