//! CRT fill-parameter tool: routes the fishnet's stream and lake segments,
//! runs CRT in fill mode and writes the filled land surface back.
//!
//! Usage: crt-fill -i project.json [--overwrite] [--debug]
//!
//! Console output follows `--debug`; a full DEBUG log of every run is
//! written to `logs/crt_fill_log.txt` next to the project file.
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{info, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, Layer};

use crt_core::{run_crt_fill, CrtFillConfig};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "crt-fill", about = "Fill the land surface model with the Cascade Routing Tool")]
struct Args {
    /// Project file (JSON)
    #[arg(short, long, value_name = "PATH")]
    ini: PathBuf,

    /// Re-copy the CRT executable into the fill workspace
    #[arg(short, long)]
    overwrite: bool,

    /// Debug level logging
    #[arg(short, long)]
    debug: bool,
}

// ── Logging ──────────────────────────────────────────────────────────────────

const LOG_WS_NAME: &str = "logs";
const LOG_FILE: &str = "crt_fill_log.txt";

/// Per-run log file for the project file at `ini` (already absolute).
fn log_path(ini: &Path) -> PathBuf {
    ini.parent().unwrap_or_else(|| Path::new(".")).join(LOG_WS_NAME).join(LOG_FILE)
}

/// Console at `console_level`, plus everything down to DEBUG in `log_file`.
fn build_subscriber(console_level: Level, log_file: File) -> impl Subscriber + Send + Sync {
    let console = fmt::layer()
        .with_target(false)
        .with_filter(LevelFilter::from_level(console_level));
    let file = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .with_filter(LevelFilter::DEBUG);
    tracing_subscriber::registry().with(console).with(file)
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    let ini = fs::canonicalize(&args.ini)
        .with_context(|| format!("project file {} not found", args.ini.display()))?;

    let log_file = log_path(&ini);
    if let Some(log_ws) = log_file.parent() {
        fs::create_dir_all(log_ws)
            .with_context(|| format!("creating log workspace {}", log_ws.display()))?;
    }
    let file = File::create(&log_file)
        .with_context(|| format!("creating log file {}", log_file.display()))?;
    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    tracing::subscriber::set_global_default(build_subscriber(level, file))?;

    let cwd = std::env::current_dir().context("reading current directory")?;
    info!("{}", "#".repeat(80));
    info!("{:<20}{}", "Run Time Stamp:", Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{:<20}{}", "Current Directory:", cwd.display());
    info!("{:<20}{}", "Script:", env!("CARGO_PKG_NAME"));
    info!("{:<20}{}", "Log File:", log_file.display());

    let config = CrtFillConfig::from_path(&ini)
        .with_context(|| format!("loading project file {}", ini.display()))?;
    let report = run_crt_fill(&config, args.overwrite).context("CRT fill run failed")?;

    info!(
        "Done: {} x {} grid, {} segments, {} cells filled, {} elevations replaced, {} values skipped",
        report.nrows,
        report.ncols,
        report.routing.segments.len(),
        report.import.filled,
        report.import.overridden,
        report.import.skipped,
    );
    Ok(())
}
