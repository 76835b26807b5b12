//! Step-truncating sliding windows
//!
//! Each axis buffer grows to `size + step` samples, signals "ready", and
//! then drops its oldest `step` samples in one batch. Consecutive windows
//! therefore overlap by `size - step` samples and advance in fixed steps.
//! The first `step` samples after creation only fill the buffer and never
//! appear in a ready window.

use crate::types::Sample;

use super::ProcessingError;

/// Sliding buffer of one axis.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    values: Vec<f64>,
    size: usize,
    step: usize,
}

impl WindowBuffer {
    pub fn new(size: usize, step: usize) -> Result<Self, ProcessingError> {
        if size == 0 || step == 0 || step > size {
            return Err(ProcessingError::InvalidWindow { size, step });
        }
        Ok(Self {
            values: Vec::with_capacity(size + step),
            size,
            step,
        })
    }

    /// Length at which the buffer reports ready.
    pub const fn capacity(&self) -> usize {
        self.size + self.step
    }

    /// Append one value. Returns `true` when the buffer has reached trigger
    /// length and must be truncated before the next push.
    ///
    /// Pushing into a full buffer truncates it first so the length never
    /// exceeds capacity.
    pub fn push(&mut self, value: f64) -> bool {
        if self.is_ready() {
            tracing::debug!(len = self.values.len(), "Push into ready window, truncating first");
            self.truncate();
        }
        self.values.push(value);
        self.is_ready()
    }

    pub fn is_ready(&self) -> bool {
        self.values.len() == self.capacity()
    }

    /// Evict the oldest `step` values.
    pub fn truncate(&mut self) {
        let n = self.step.min(self.values.len());
        self.values.drain(..n);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One completed window, all three axes, post-truncation.
#[derive(Debug, Clone, Copy)]
pub struct WindowView<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub z: &'a [f64],
}

/// The three axis buffers, always updated in lockstep.
#[derive(Debug, Clone)]
pub struct AxisWindows {
    x: WindowBuffer,
    y: WindowBuffer,
    z: WindowBuffer,
}

impl AxisWindows {
    pub fn new(size: usize, step: usize) -> Result<Self, ProcessingError> {
        Ok(Self {
            x: WindowBuffer::new(size, step)?,
            y: WindowBuffer::new(size, step)?,
            z: WindowBuffer::new(size, step)?,
        })
    }

    /// Push one sample into every axis. When all three reach trigger
    /// length, all three are truncated together and the resulting
    /// `size`-long window is returned.
    pub fn push(&mut self, sample: Sample) -> Option<WindowView<'_>> {
        let ready = [
            self.x.push(sample.x()),
            self.y.push(sample.y()),
            self.z.push(sample.z()),
        ];
        debug_assert!(ready.iter().all(|&r| r == ready[0]), "axis windows out of lockstep");

        if !ready.iter().all(|&r| r) {
            return None;
        }

        self.x.truncate();
        self.y.truncate();
        self.z.truncate();

        Some(WindowView {
            x: self.x.as_slice(),
            y: self.y.as_slice(),
            z: self.z.as_slice(),
        })
    }
}
