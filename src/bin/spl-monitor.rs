use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spl_monitor::analysis::LevelAdjuster;
use spl_monitor::audio::{replay_wav, start_capture, AudioLevelMeter};
use spl_monitor::calibration::{CalibrationStore, Channel, Interpolation};
use spl_monitor::config::AppConfig;
use spl_monitor::context::AppContext;
use spl_monitor::error::{log_audio_error, AudioError};
use spl_monitor::http::start_server;
use spl_monitor::status::{format_level, spawn_status_reporter, StatusBoard};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "spl-monitor",
    about = "Calibrated SPL metering with live WebSocket fan-out"
)]
struct Cli {
    /// JSON config file (defaults to assets/spl_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory containing calibration files
    #[arg(long, global = true)]
    calfiles: Option<PathBuf>,
    /// Frequency (Hz) at which calibration curves are read
    #[arg(long, global = true)]
    frequency: Option<f64>,
    /// dB SPL corresponding to 0 dBFS
    #[arg(long, global = true)]
    sploffset: Option<f64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP/WebSocket server and meter the capture device (default)
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// Capture device name
        #[arg(long)]
        device: Option<String>,
        /// Only serve webhook input, do not open the capture device
        #[arg(long)]
        no_capture: bool,
    },
    /// Meter a stereo WAV file offline and print the levels
    Measure {
        #[arg(long)]
        wav: PathBuf,
        /// Stereo frames per metered buffer
        #[arg(long)]
        frames: Option<usize>,
    },
    /// Load the calibration directory and print what each channel resolves to
    Calibration,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    if let Some(dir) = cli.calfiles {
        config.calibration.directory = dir;
    }
    if let Some(frequency) = cli.frequency {
        config.calibration.frequency_hz = frequency;
    }
    if let Some(offset) = cli.sploffset {
        config.levels.spl_offset_db = offset;
    }

    match cli.command.unwrap_or(Commands::Serve {
        bind: None,
        device: None,
        no_capture: false,
    }) {
        Commands::Serve {
            bind,
            device,
            no_capture,
        } => {
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
            }
            if let Some(device) = device {
                config.audio.device_name = device;
            }
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("building tokio runtime")?;
            runtime.block_on(run_serve(config, !no_capture))
        }
        Commands::Measure { wav, frames } => run_measure(&config, &wav, frames),
        Commands::Calibration => run_calibration(&config),
    }
}

fn load_store(config: &AppConfig) -> Result<CalibrationStore> {
    CalibrationStore::load_with_extension(
        &config.calibration.directory,
        &config.calibration.extension,
        config.calibration.frequency_hz,
    )
    .with_context(|| {
        format!(
            "loading calibration files from {}",
            config.calibration.directory.display()
        )
    })
}

async fn run_serve(config: AppConfig, capture: bool) -> Result<ExitCode> {
    let store = load_store(&config)?;
    let bind_addr = config.server.bind_addr;
    let status_interval = config.server.status_interval();
    let audio = config.audio.clone();
    let context = AppContext::with_store(config, store);

    // Keeps the input stream alive until shutdown
    let _capture = if capture {
        match start_capture(&audio, Arc::clone(context.meter())) {
            Ok(stream) => {
                tracing::info!(device = %stream.device_name(), "capture started");
                Some(stream)
            }
            Err(AudioError::CaptureUnavailable) => {
                tracing::warn!("live capture not compiled in, serving webhook input only");
                None
            }
            Err(err) => {
                log_audio_error(&err, "run_serve");
                return Err(err).context("starting audio capture");
            }
        }
    } else {
        None
    };

    let reporter = spawn_status_reporter(Arc::clone(context.status()), status_interval);
    let server = start_server(context, bind_addr).await?;
    tracing::info!("spl-monitor listening on http://{}", server.local_addr());

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutdown signal received");

    reporter.abort();
    server.shutdown().await?;
    Ok(ExitCode::from(0))
}

fn run_measure(config: &AppConfig, wav: &Path, frames: Option<usize>) -> Result<ExitCode> {
    let store = Arc::new(load_store(config)?);
    let meter = AudioLevelMeter::new(
        LevelAdjuster::new(store, config.levels.spl_offset_db),
        Arc::new(StatusBoard::default()),
    );
    let frames = frames.unwrap_or(config.audio.frames_per_buffer as usize);
    let summary = replay_wav(wav, &meter, frames)
        .with_context(|| format!("metering {}", wav.display()))?;

    println!(
        "{}: {} buffers, {} frames at {} Hz",
        wav.display(),
        summary.buffers,
        summary.frames,
        summary.sample_rate
    );
    if let Some(last) = summary.last {
        println!(
            "last    Left: {} dBFS {} dBSPL - Right: {} dBFS {} dBSPL",
            format_level(last.left_dbfs),
            format_level(last.left_dbspl),
            format_level(last.right_dbfs),
            format_level(last.right_dbspl)
        );
    }
    println!(
        "max     Left: {} dBSPL - Right: {} dBSPL",
        format_level(summary.max_left_dbspl),
        format_level(summary.max_right_dbspl)
    );
    Ok(ExitCode::from(0))
}

fn run_calibration(config: &AppConfig) -> Result<ExitCode> {
    let store = load_store(config)?;
    println!(
        "{} at {} Hz",
        config.calibration.directory.display(),
        store.frequency()
    );

    for channel in Channel::ALL {
        let curve = store.curve(channel);
        let range = curve
            .frequency_range()
            .map(|(min, max)| format!("{min}..{max} Hz"))
            .unwrap_or_else(|| "empty".to_string());
        let lookup = match store.lookup(channel) {
            Interpolation::Found(spl) => format!("{spl:.3} dB"),
            Interpolation::OutOfRange { .. } => "out of range (0.0 used)".to_string(),
            Interpolation::Empty => "no data (0.0 used)".to_string(),
        };
        println!(
            "{:<5}  sensitivity {:+.2} dB  points {:>4}  range {}  curve {}",
            channel.label(),
            curve.sensitivity(),
            curve.points().len(),
            range,
            lookup
        );
    }
    Ok(ExitCode::from(0))
}
