//! dmivwap CLI: replay a bar file through the DMI/VWAP study.
//!
//! Commands:
//! - `run`: load bars from CSV, evaluate every bar, write CSV or JSON
//! - `validate`: parse and validate a study config, print its id

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dmivwap_core::data::{export_csv, export_json, load_bars_csv, StudyRun};
use dmivwap_core::domain::{AnchorPeriod, BarAggregation};
use dmivwap_core::engine::{DmiVwapStudy, StudyOutput};
use dmivwap_core::indicators::AverageMethod;
use dmivwap_core::StudyConfig;

#[derive(Parser)]
#[command(
    name = "dmivwap",
    about = "DMI with period-anchored VWAP: buyers/sellers balance, ADX and buy signals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the study over a CSV bar file.
    Run {
        /// Bar file with time, open, high, low, close, volume[, vwap][, imp_volatility].
        #[arg(long)]
        input: PathBuf,

        /// Study config (TOML). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Averaging window.
        #[arg(long)]
        length: Option<usize>,

        /// simple, exponential, weighted, wilders or hull.
        #[arg(long)]
        average_type: Option<AverageMethod>,

        /// VWAP anchor: day, week or month.
        #[arg(long)]
        time_frame: Option<AnchorPeriod>,

        /// Bars back for the trend label.
        #[arg(long)]
        trend_length: Option<usize>,

        /// Chart bar size of the input (e.g. 5m, 1h, day).
        #[arg(long)]
        aggregation: Option<BarAggregation>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file. Writes to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Log and skip rejected bars instead of stopping at the first one.
        #[arg(long, default_value_t = false)]
        skip_invalid: bool,
    },
    /// Parse and validate a study config.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Default)]
struct Overrides {
    length: Option<usize>,
    average_type: Option<AverageMethod>,
    time_frame: Option<AnchorPeriod>,
    trend_length: Option<usize>,
    aggregation: Option<BarAggregation>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dmivwap=info,dmivwap_core=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            config,
            length,
            average_type,
            time_frame,
            trend_length,
            aggregation,
            format,
            output,
            skip_invalid,
        } => {
            let overrides = Overrides {
                length,
                average_type,
                time_frame,
                trend_length,
                aggregation,
            };
            let config = build_config(config.as_deref(), overrides)?;
            run_study(&input, config, format, output.as_deref(), skip_invalid)
        }
        Commands::Validate { config } => run_validate(&config),
    }
}

fn build_config(path: Option<&Path>, overrides: Overrides) -> Result<StudyConfig> {
    let mut config = match path {
        Some(path) => StudyConfig::from_file(path)?,
        None => StudyConfig::default(),
    };
    if let Some(v) = overrides.length {
        config.length = v;
    }
    if let Some(v) = overrides.average_type {
        config.average_type = v;
    }
    if let Some(v) = overrides.time_frame {
        config.time_frame = v;
    }
    if let Some(v) = overrides.trend_length {
        config.trend_length = v;
    }
    if let Some(v) = overrides.aggregation {
        config.aggregation = v;
    }
    config.validate()?;
    Ok(config)
}

fn run_study(
    input: &Path,
    config: StudyConfig,
    format: OutputFormat,
    output: Option<&Path>,
    skip_invalid: bool,
) -> Result<()> {
    let bars = load_bars_csv(input)?;
    if bars.is_empty() {
        bail!("{} contains no bars", input.display());
    }

    let mut study = DmiVwapStudy::new(config)?;
    let mut outputs: Vec<StudyOutput> = Vec::with_capacity(bars.len());
    let mut skipped = 0usize;
    for (row, bar) in bars.iter().enumerate() {
        match study.next(bar) {
            Ok(out) => outputs.push(out),
            Err(e) if skip_invalid => {
                warn!(row = row + 1, error = %e, "skipping bar");
                skipped += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("row {}", row + 1)),
        }
    }

    let undefined_vwap = outputs.iter().filter(|o| o.vwap().is_err()).count();
    if undefined_vwap > 0 {
        warn!(
            bars = undefined_vwap,
            "VWAP undefined where the anchor period had no volume"
        );
    }

    let run = StudyRun::new(config, outputs);
    info!(
        config_id = %run.config_id,
        bars = run.bar_count,
        skipped,
        buy_signals = run.buy_signals,
        warm_after = run.outputs.iter().position(|o| o.warm).map(|i| i + 1),
        "study complete"
    );

    let rendered = match format {
        OutputFormat::Csv => export_csv(&run.outputs)?,
        OutputFormat::Json => export_json(&run)?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "output written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn run_validate(path: &Path) -> Result<()> {
    let config = StudyConfig::from_file(path)?;
    println!("Config OK: {}", path.display());
    println!("  length       = {}", config.length);
    println!("  average_type = {}", config.average_type);
    println!("  time_frame   = {}", config.time_frame);
    println!("  trend_length = {}", config.trend_length);
    println!("  aggregation  = {}", config.aggregation);
    println!("  config_id    = {}", config.config_id());
    Ok(())
}
