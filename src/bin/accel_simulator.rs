//! Synthetic accelerometer board
//!
//! Streams device-style `x,y,z\r\n` lines on stdout so the monitor can be
//! exercised without hardware. Progress goes to stderr.
//!
//! # Usage
//! ```bash
//! accel-simulator --rate 100 --cycle 600 | accelmon --stdio analyze
//! ```

use std::io::{self, BufWriter, Write};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use accelmon::sensors::{SyntheticAccelerometer, VibrationPhase};
use accelmon::types::Bias;

#[derive(Parser, Debug)]
#[command(name = "accel-simulator")]
#[command(about = "Synthetic 3-axis accelerometer line stream")]
#[command(version)]
struct Args {
    /// Phase to start in: normal, fault1 or fault2
    #[arg(short, long, default_value = "normal")]
    phase: VibrationPhase,

    /// Advance to the next phase every N samples (0 = stay in one phase)
    #[arg(long, default_value = "0")]
    cycle: u64,

    /// Stop after N samples (0 = run until interrupted)
    #[arg(short = 'n', long, default_value = "0")]
    samples: u64,

    /// Output rate in Hz (0 = as fast as possible)
    #[arg(short, long, default_value = "100")]
    rate: u32,

    /// Resting reading as "x,y,z"
    #[arg(long, default_value = "-130,-85,935", allow_hyphen_values = true)]
    offset: String,

    /// Fraction of lines replaced with malformed output
    #[arg(long, default_value = "0.0")]
    malformed_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn parse_offset(raw: &str) -> Result<Bias> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid offset '{raw}'"))?;
    let [x, y, z] = values[..] else {
        bail!("offset needs 3 values, got {}", values.len());
    };
    Ok(Bias::new(x, y, z))
}

fn next_phase(phase: VibrationPhase) -> VibrationPhase {
    let all = VibrationPhase::ALL;
    let i = all.iter().position(|p| *p == phase).unwrap_or(0);
    all[(i + 1) % all.len()]
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    let offset = parse_offset(&args.offset)?;
    let mut sensor = SyntheticAccelerometer::new(offset, args.seed).with_malformed_rate(args.malformed_rate);
    sensor.set_phase(args.phase);

    let interval = (args.rate > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(args.rate)));
    info!(
        phase = sensor.phase().name(),
        offset = %offset,
        rate_hz = args.rate,
        seed = ?args.seed,
        "Simulator started"
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let started = Instant::now();
    let mut emitted = 0u64;

    while args.samples == 0 || emitted < args.samples {
        if args.cycle > 0 && emitted > 0 && emitted % args.cycle == 0 {
            let phase = next_phase(sensor.phase());
            sensor.set_phase(phase);
            info!(sample = emitted, phase = phase.name(), "Phase change");
        }

        let line = sensor.next_line();
        if let Err(e) = out.write_all(line.as_bytes()) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                break;
            }
            return Err(e).context("writing to stdout");
        }
        emitted += 1;

        if let Some(interval) = interval {
            match out.flush() {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => break,
                other => other.context("flushing stdout")?,
            }
            // pace against the start time so rounding does not drift
            let due = started + interval.mul_f64(emitted as f64);
            if let Some(wait) = due.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }

    match out.flush() {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
        other => other.context("flushing stdout")?,
    }
    info!(samples = emitted, elapsed_ms = started.elapsed().as_millis() as u64, "Simulator finished");
    Ok(())
}
