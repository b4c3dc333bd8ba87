//! CLI Entry Point for sweeper
//!
//! Two modes:
//! - `1` / `decode`: print the records of a binary log to stdout
//! - `2` / `capture`: snapshot the sweep ring into a binary log until Ctrl+C
//!
//! # Usage
//!
//! ```bash
//! sweeper 2 sweep.bin                 # capture from the driver's mapped region
//! sweeper 2 sweep.bin --source udp    # capture datagrams pushed by a remote agent
//! sweeper 1 sweep.bin > sweep.csv     # decode
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sweeper::config::Settings;
use sweeper::dump::{self, CaptureStats, DumpWriter};
use sweeper::logging;
use sweeper::shutdown::CancelToken;
use sweeper::source::{DatagramSource, MappedSource};
use sweeper::sweep::{CsvFormatter, JsonLinesFormatter, RecordFormatter};
use sweeper::AppResult;
use tracing::info;

#[derive(Parser)]
#[command(name = "sweeper")]
#[command(about = "Capture and decode sector sweep ring buffer dumps", long_about = None)]
struct Cli {
    /// 1 = decode a log, 2 = capture into a log
    #[arg(value_enum)]
    mode: Mode,

    /// Binary log file
    path: PathBuf,

    /// Where capture snapshots come from
    #[arg(long, value_enum, default_value_t = SourceKind::Mmap)]
    source: SourceKind,

    /// Decode output format
    #[arg(long, value_enum, default_value_t = OutputKind::Csv)]
    format: OutputKind,

    /// Configuration file (defaults to config/sweeper.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    #[value(name = "1", alias = "decode")]
    Decode,
    #[value(name = "2", alias = "capture")]
    Capture,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceKind {
    Mmap,
    Udp,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputKind {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            Settings::load_from(path)?
        }
        None => Settings::load()?,
    };
    logging::init_from_settings(&settings)?;

    match cli.mode {
        Mode::Decode => run_decode(&cli.path, cli.format, &settings),
        Mode::Capture => run_capture(cli.path, cli.source, settings).await,
    }
}

fn run_decode(path: &Path, format: OutputKind, settings: &Settings) -> Result<()> {
    let mut formatter: Box<dyn RecordFormatter> = match format {
        OutputKind::Csv => Box::new(CsvFormatter),
        OutputKind::Json => Box::new(JsonLinesFormatter),
    };

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    dump::decode_file(path, settings.layout, formatter.as_mut(), &mut out)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    out.flush()?;
    Ok(())
}

async fn run_capture(path: PathBuf, source: SourceKind, settings: Settings) -> Result<()> {
    let cancel = CancelToken::new();

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current iteration");
            signal_token.cancel();
        }
    });

    let stats = tokio::task::spawn_blocking(move || capture(&path, source, &settings, &cancel))
        .await
        .context("Capture thread panicked")??;

    info!(snapshots = stats.snapshots, bytes = stats.bytes, "Capture complete");
    Ok(())
}

/// Acquire the source, then the log file, then poll until cancelled.
fn capture(
    path: &Path,
    source: SourceKind,
    settings: &Settings,
    cancel: &CancelToken,
) -> AppResult<CaptureStats> {
    let expected_len = settings.layout.chunk_len();

    match source {
        SourceKind::Mmap => {
            let source = MappedSource::open(&settings.mapped, expected_len)?;
            DumpWriter::create(source, path, &settings.capture)?.run(cancel)
        }
        SourceKind::Udp => {
            let source = DatagramSource::bind(&settings.network, expected_len)?;
            // The receive timeout paces the loop
            DumpWriter::create(source, path, &settings.capture)?
                .with_interval(Duration::ZERO)
                .run(cancel)
        }
    }
}
