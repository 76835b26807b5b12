//! Continuous analysis loop
//!
//! One iteration per inbound line:
//! parse -> bias -> windows -> features -> classify -> debounce -> command.
//! Cancellation is only observed while waiting for a line, so a window
//! that has started processing is always classified and debounced in full.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::acquisition::{parse_triple, LineEvent, LineSink, LineSource, ParseOutcome, TransportError};
use crate::classifier::{Classifier, ClassifierError};
use crate::config::MonitorConfig;
use crate::processing::{extract, AxisWindows, ProcessingError};
use crate::types::{Bias, ClassLabel, FeatureVector, StateEntry, StateTable};

use super::StateDebouncer;

/// Fatal analysis failures. Parse skips never surface here.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Transport failed during analysis: {0}")]
    Transport(#[from] TransportError),

    #[error("Classifier failed: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Counters for one analysis session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub lines_read: u64,
    pub lines_skipped: u64,
    pub timeouts: u64,
    pub windows_classified: u64,
    pub actions_sent: u64,
}

/// Result of one completed window.
#[derive(Debug, Clone)]
pub struct WindowReport {
    /// 1-based window count within the session
    pub index: u64,
    pub features: FeatureVector,
    pub label: ClassLabel,
    /// Feature extraction plus classification time
    pub latency_ms: f64,
    /// Set when this window confirmed a state
    pub action: Option<StateEntry>,
}

pub struct StreamProcessor<C: Classifier> {
    classifier: C,
    bias: Bias,
    states: StateTable,
    windows: AxisWindows,
    debouncer: StateDebouncer,
    stats: SessionStats,
}

impl<C: Classifier> StreamProcessor<C> {
    pub fn new(
        classifier: C,
        bias: Bias,
        states: StateTable,
        windows: AxisWindows,
        debouncer: StateDebouncer,
    ) -> Self {
        Self {
            classifier,
            bias,
            states,
            windows,
            debouncer,
            stats: SessionStats::default(),
        }
    }

    /// Window geometry, debounce threshold and state table from config.
    pub fn from_config(classifier: C, bias: Bias, config: &MonitorConfig) -> Result<Self, ProcessingError> {
        let windows = AxisWindows::new(config.window.size, config.window.step)?;
        Ok(Self::new(
            classifier,
            bias,
            config.states.clone(),
            windows,
            StateDebouncer::new(config.debounce.threshold),
        ))
    }

    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub const fn debouncer(&self) -> &StateDebouncer {
        &self.debouncer
    }

    /// Feed one raw line. Returns a report when it completed a window.
    ///
    /// Malformed lines are counted and skipped without touching any window.
    pub fn process_line(&mut self, line: &[u8]) -> Result<Option<WindowReport>, ClassifierError> {
        self.stats.lines_read += 1;

        let raw = match parse_triple(line) {
            ParseOutcome::Sample(raw) => raw,
            ParseOutcome::Skip(reason) => {
                self.stats.lines_skipped += 1;
                debug!(%reason, "Skipping line");
                return Ok(None);
            }
        };

        let sample = self.bias.correct(raw);
        let Some(window) = self.windows.push(sample) else {
            return Ok(None);
        };

        let started = Instant::now();
        let features = extract(&window);
        let label = self.classifier.classify(&features)?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        if !self.states.contains(label) {
            return Err(ClassifierError::UnknownLabel(label));
        }

        self.stats.windows_classified += 1;
        let action = self
            .debouncer
            .observe(label)
            .and_then(|confirmed| self.states.get(confirmed).cloned());

        Ok(Some(WindowReport {
            index: self.stats.windows_classified,
            features,
            label,
            latency_ms,
            action,
        }))
    }

    /// Run until cancelled or the source ends.
    ///
    /// Transport and classifier errors end the session.
    pub async fn run<L>(&mut self, link: &mut L, cancel: &CancellationToken) -> Result<SessionStats, AnalysisError>
    where
        L: LineSource + LineSink + ?Sized,
    {
        info!(
            source = link.source_name(),
            classifier = %self.classifier.describe(),
            bias = %self.bias,
            "[StreamProcessor] Analysing"
        );

        let result = self.run_inner(link, cancel).await;
        let stats = self.stats;
        info!(
            lines_read = stats.lines_read,
            lines_skipped = stats.lines_skipped,
            timeouts = stats.timeouts,
            windows = stats.windows_classified,
            actions = stats.actions_sent,
            "[StreamProcessor] Session finished"
        );
        if let Err(e) = &result {
            error!("[StreamProcessor] {}", e);
        }
        result.map(|()| stats)
    }

    async fn run_inner<L>(&mut self, link: &mut L, cancel: &CancellationToken) -> Result<(), AnalysisError>
    where
        L: LineSource + LineSink + ?Sized,
    {
        loop {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("[StreamProcessor] Shutdown signal received");
                    return Ok(());
                }
                event = link.next_line() => event?,
            };

            let line = match event {
                LineEvent::Line(line) => line,
                LineEvent::TimedOut => {
                    self.stats.timeouts += 1;
                    debug!("Read timed out");
                    continue;
                }
                LineEvent::Eof => {
                    info!("[StreamProcessor] Source reached end of stream");
                    return Ok(());
                }
            };

            let Some(report) = self.process_line(&line)? else {
                continue;
            };
            self.log_report(&report, link.pending_input());

            if let Some(entry) = &report.action {
                link.send_command(entry.code.as_bytes()).await?;
                self.stats.actions_sent += 1;
                info!(code = %entry.code, label = report.label.0, "State confirmed: {}", entry.label);
            }
        }
    }

    fn log_report(&self, report: &WindowReport, pending: usize) {
        let f = &report.features;
        info!(
            window = report.index,
            max_x = f.x.max,
            std_x = f.x.std,
            rms_x = f.x.rms,
            max_y = f.y.max,
            std_y = f.y.std,
            rms_y = f.y.rms,
            max_z = f.z.max,
            std_z = f.z.std,
            rms_z = f.z.rms,
            latency_ms = report.latency_ms,
            pending_input = pending,
            label = report.label.0,
            state = self.states.get(report.label).map_or("?", |e| e.label.as_str()),
            "Window classified"
        );
    }
}
