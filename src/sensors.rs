//! Synthetic accelerometer stream
//!
//! Produces device-style `x,y,z\r\n` lines for bench testing without the
//! sensor board: a constant gravity/mount offset plus a sinusoidal
//! vibration whose amplitude and frequency depend on the simulated
//! machine state, plus Gaussian noise.

use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::types::{Bias, RawTriple};

/// Nominal output rate of the board.
pub const SAMPLE_RATE_HZ: f64 = 100.0;

/// Lines emitted instead of a reading when malformed output is enabled.
const MALFORMED_LINES: [&str; 4] = ["", "512,-3", "x,y,z", "ADXL345 ready"];

/// Simulated machine condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VibrationPhase {
    Normal,
    Fault1,
    Fault2,
}

impl VibrationPhase {
    pub const ALL: [VibrationPhase; 3] = [Self::Normal, Self::Fault1, Self::Fault2];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Fault1 => "FAULT 1",
            Self::Fault2 => "FAULT 2",
        }
    }

    /// Peak vibration amplitude per axis in raw counts.
    fn amplitude(self) -> [f64; 3] {
        match self {
            Self::Normal => [4.0, 4.0, 6.0],
            Self::Fault1 => [35.0, 20.0, 15.0],
            Self::Fault2 => [90.0, 110.0, 60.0],
        }
    }

    fn frequency_hz(self) -> f64 {
        match self {
            Self::Normal => 12.5,
            Self::Fault1 => 24.0,
            Self::Fault2 => 7.0,
        }
    }

    fn noise_sigma(self) -> f64 {
        match self {
            Self::Normal => 1.5,
            Self::Fault1 => 4.0,
            Self::Fault2 => 9.0,
        }
    }
}

impl std::str::FromStr for VibrationPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "fault1" | "fault-1" => Ok(Self::Fault1),
            "fault2" | "fault-2" => Ok(Self::Fault2),
            other => Err(format!("unknown phase '{other}' (normal, fault1, fault2)")),
        }
    }
}

pub struct SyntheticAccelerometer {
    rng: StdRng,
    phase: VibrationPhase,
    offset: Bias,
    malformed_rate: f64,
    tick: u64,
}

impl SyntheticAccelerometer {
    /// `offset` is the resting reading (what calibration should recover).
    pub fn new(offset: Bias, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            phase: VibrationPhase::Normal,
            offset,
            malformed_rate: 0.0,
            tick: 0,
        }
    }

    /// Fraction of lines (0..=1) replaced by garbage.
    pub fn with_malformed_rate(mut self, rate: f64) -> Self {
        self.malformed_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn set_phase(&mut self, phase: VibrationPhase) {
        self.phase = phase;
    }

    pub const fn phase(&self) -> VibrationPhase {
        self.phase
    }

    pub const fn samples_generated(&self) -> u64 {
        self.tick
    }

    /// Next reading, before any line formatting.
    pub fn next_reading(&mut self) -> RawTriple {
        let t = self.tick as f64 / SAMPLE_RATE_HZ;
        self.tick += 1;

        let amplitude = self.phase.amplitude();
        let omega = std::f64::consts::TAU * self.phase.frequency_hz();
        let sigma = self.phase.noise_sigma();

        let mut axis = |i: usize, base: f64, shift: f64| {
            let noise: f64 = self.rng.sample(StandardNormal);
            base + amplitude[i] * (omega * t + shift).sin() + sigma * noise
        };
        let x = axis(0, self.offset.x, 0.0);
        let y = axis(1, self.offset.y, 2.1);
        let z = axis(2, self.offset.z, 4.2);
        RawTriple::new(x, y, z)
    }

    /// Next output line, CRLF terminated.
    pub fn next_line(&mut self) -> String {
        if self.malformed_rate > 0.0 && self.rng.gen_bool(self.malformed_rate) {
            let garbage = MALFORMED_LINES[self.rng.gen_range(0..MALFORMED_LINES.len())];
            return format!("{garbage}\r\n");
        }
        let r = self.next_reading();
        format!("{:.0},{:.0},{:.0}\r\n", r.x, r.y, r.z)
    }
}
