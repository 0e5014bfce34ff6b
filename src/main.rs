//! CLI entry point for the area violin chart batch.
//!
//! With no arguments, renders every numeracy and literacy chart from input
//! files in the current directory.

use anyhow::Result;
use area_violin::batch::{BatchOptions, run_batch};
use area_violin::config::{DatasetConfig, DatasetKind};
use area_violin::render::ChartCanvas;
use clap::{Parser, ValueEnum};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "area_violin")]
#[command(
    about = "Render per-area accuracy distributions for assessment cohorts",
    long_about = None
)]
struct Cli {
    /// Directory containing the cohort spreadsheets and CSV exports
    #[arg(short = 'd', long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory charts and run summaries are written under
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Which dataset profiles to run
    #[arg(long, value_enum, default_value_t = DatasetChoice::All)]
    dataset: DatasetChoice,
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetChoice {
    All,
    Numeracy,
    Literacy,
}

impl DatasetChoice {
    fn kinds(self) -> Vec<DatasetKind> {
        match self {
            DatasetChoice::All => vec![DatasetKind::Numeracy, DatasetKind::Literacy],
            DatasetChoice::Numeracy => vec![DatasetKind::Numeracy],
            DatasetChoice::Literacy => vec![DatasetKind::Literacy],
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/area_violin.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("area_violin.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let configs = cli
        .dataset
        .kinds()
        .into_iter()
        .map(DatasetConfig::builtin)
        .collect::<Result<Vec<_>>>()?;

    let options = BatchOptions {
        data_dir: cli.data_dir,
        out_dir: cli.out_dir,
        canvas: ChartCanvas::default(),
    };

    let index = run_batch(&configs, &options)?;
    info!(charts = index.charts.len(), out_dir = %options.out_dir.display(), "Batch complete");

    Ok(())
}
