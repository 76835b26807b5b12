//! accelmon - accelerometer stream monitor
//!
//! # Usage
//!
//! ```bash
//! # List serial ports and store the one to use
//! accelmon configure --list
//! accelmon configure --port /dev/ttyUSB0 --baud 115200
//!
//! # Zero the sensor, record a training set, then monitor
//! accelmon calibrate
//! accelmon capture --output data/normal_01 --samples 3000
//! accelmon analyze --model model.json
//!
//! # Bench test without hardware
//! accel-simulator --cycle 600 | accelmon --stdio analyze
//! ```
//!
//! # Environment Variables
//!
//! - `ACCELMON_CONFIG`: path to the TOML config (default: ./accelmon.toml)
//! - `RUST_LOG`: logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use accelmon::acquisition::{self, LineLink, LineSource, StdioTransport, Transport};
use accelmon::classifier::{Classifier, LogisticModel};
use accelmon::config::{self, MonitorConfig};
use accelmon::pipeline::{self, StreamProcessor};
use accelmon::processing::{CalibrationError, Calibrator};
use accelmon::storage::{self, BiasRecord};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "accelmon")]
#[command(about = "Accelerometer stream monitor")]
#[command(version)]
struct CliArgs {
    /// Connect to a serial-over-network bridge instead of the serial port
    #[arg(long, value_name = "HOST:PORT", global = true, conflicts_with = "stdio")]
    tcp: Option<String>,

    /// Read sensor lines from stdin and write commands to stdout
    #[arg(long, global = true)]
    stdio: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Show serial ports and/or store serial settings in the config file
    Configure {
        /// Serial port to use
        #[arg(long)]
        port: Option<String>,
        /// Baud rate
        #[arg(long)]
        baud: Option<u32>,
        /// List detected serial ports
        #[arg(long)]
        list: bool,
    },

    /// Measure the resting offset of each axis and store it
    Calibrate {
        /// Readings to average (default from config)
        #[arg(long)]
        samples: Option<usize>,
    },

    /// Record bias-corrected readings to <OUTPUT>.csv and <OUTPUT>_stats.txt
    Capture {
        /// Output path without extension
        #[arg(short, long)]
        output: PathBuf,
        /// Number of readings to record
        #[arg(short = 'n', long)]
        samples: usize,
    },

    /// Classify the live stream and send state commands until Ctrl+C
    Analyze {
        /// Model file (default from config)
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

// ============================================================================
// Modes
// ============================================================================

async fn run_calibrate<L>(link: &mut L, samples: Option<usize>, cancel: &CancellationToken) -> Result<()>
where
    L: LineSource + ?Sized,
{
    let cfg = config::get();
    let samples = samples.unwrap_or(cfg.calibration.samples);
    info!(samples, "Calibrating, keep the sensor at rest");

    let bias = match Calibrator::new(samples).run(link, cancel).await {
        Ok(bias) => bias,
        Err(CalibrationError::Cancelled) => {
            warn!("Calibration cancelled, previous bias remains in effect");
            return Ok(());
        }
        Err(e) => {
            error!("Calibration failed, previous bias remains in effect");
            return Err(e.into());
        }
    };

    let path = cfg.storage.bias_path();
    storage::save_bias(&path, &BiasRecord::new(bias, samples))?;
    info!(bias = %bias, path = %path.display(), "Bias stored");
    Ok(())
}

async fn run_capture<L>(link: &mut L, output: &Path, samples: usize, cancel: &CancellationToken) -> Result<()>
where
    L: LineSource + ?Sized,
{
    let cfg = config::get();
    let Some(name) = output.file_name().and_then(|n| n.to_str()) else {
        bail!("invalid output name: {}", output.display());
    };
    let dir = output.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));

    let (bias, _) = storage::load_bias_or(&cfg.storage.bias_path(), cfg.calibration.default_bias());
    info!(samples, output = %output.display(), "Capturing");

    match pipeline::record(link, samples, bias, cancel).await {
        Ok(dataset) => {
            dataset.write(dir, name)?;
            Ok(())
        }
        Err(pipeline::CaptureError::Cancelled) => {
            warn!("Capture cancelled, nothing written");
            Ok(())
        }
        Err(e) => {
            error!("Capture failed, nothing written");
            Err(e.into())
        }
    }
}

async fn run_analyze<L>(link: &mut L, model: Option<PathBuf>, cancel: &CancellationToken) -> Result<()>
where
    L: LineSource + acquisition::LineSink + ?Sized,
{
    let cfg = config::get();
    let model_path = model.unwrap_or_else(|| cfg.model.path.clone());
    let model = LogisticModel::load(&model_path)?;
    for class in model.classes() {
        if !cfg.states.contains(*class) {
            warn!(label = class.0, "Model class has no entry in the state table");
        }
    }
    info!(model = %model.describe(), "Classifier ready");

    let (bias, _) = storage::load_bias_or(&cfg.storage.bias_path(), cfg.calibration.default_bias());
    let mut processor = StreamProcessor::from_config(model, bias, cfg)?;
    let stats = processor.run(link, cancel).await?;
    info!(
        windows = stats.windows_classified,
        actions = stats.actions_sent,
        "Analysis stopped"
    );
    Ok(())
}

/// Run one mode with exclusive use of `link`, then release it.
async fn run_on_link<T: Transport>(
    mut link: LineLink<T>,
    command: SubCommand,
    cancel: CancellationToken,
) -> Result<()> {
    let result = async {
        if !acquisition::discard_unless_cancelled(&mut link, &cancel)
            .await
            .context("flushing stale input")?
        {
            warn!("Cancelled before the mode started");
            return Ok(());
        }
        match command {
            SubCommand::Calibrate { samples } => run_calibrate(&mut link, samples, &cancel).await,
            SubCommand::Capture { output, samples } => run_capture(&mut link, &output, samples, &cancel).await,
            SubCommand::Analyze { model } => run_analyze(&mut link, model, &cancel).await,
            SubCommand::Configure { .. } => Ok(()),
        }
    }
    .await;

    if let Err(e) = link.close().await {
        warn!(error = %e, "Error closing link");
    }
    result
}

fn run_configure(port: Option<String>, baud: Option<u32>, list: bool) -> Result<()> {
    if list || (port.is_none() && baud.is_none()) {
        let ports = acquisition::list_ports()?;
        if ports.is_empty() {
            println!("No serial ports detected");
        }
        for p in &ports {
            println!("{p}");
        }
    }
    if port.is_none() && baud.is_none() {
        return Ok(());
    }

    let mut cfg = config::get().clone();
    if let Some(port) = port {
        cfg.serial.port = port;
    }
    if let Some(baud) = baud {
        cfg.serial.baud_rate = baud;
    }
    cfg.validate()?;

    let path = MonitorConfig::preferred_path();
    cfg.save_to_file(&path)?;
    info!(
        path = %path.display(),
        port = %cfg.serial.port,
        baud = cfg.serial.baud_rate,
        "Serial settings saved"
    );
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so --stdio can use stdout for commands
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    config::init(MonitorConfig::load());
    let cfg = config::get();

    if let SubCommand::Configure { port, baud, list } = args.command {
        return run_configure(port, baud, list);
    }

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, shutting down");
        shutdown_token.cancel();
    });

    let read_timeout = cfg.serial.read_timeout();
    if let Some(addr) = &args.tcp {
        let link = acquisition::connect_tcp(addr, read_timeout).await?;
        run_on_link(link, args.command, cancel_token).await?;
    } else if args.stdio {
        info!("Input: stdin, commands on stdout");
        let link = LineLink::new(StdioTransport::new(), "stdio").with_read_timeout(read_timeout);
        run_on_link(link, args.command, cancel_token).await?;
    } else {
        let link = acquisition::open_serial(&cfg.serial)?;
        run_on_link(link, args.command, cancel_token).await?;
    }

    info!("Done");
    Ok(())
}
