//! RUL Decision Pipeline - Main Entry Point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pipeline::{init_logging, read_labels, DecisionService, PipelineConfig, RequestMode};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rul-pipeline")]
#[command(about = "Remaining-useful-life class decisions from truck sensor readouts")]
#[command(version)]
struct CliArgs {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "RUL_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide the RUL class of every window of a readout CSV
    Decide {
        /// Pipeline configuration (TOML)
        #[arg(long, env = "RUL_CONFIG")]
        config: PathBuf,
        /// Readout CSV with vehicle_id, time_step and sensor columns
        #[arg(long)]
        input: PathBuf,
        /// Accept any number of rows instead of a single readout
        #[arg(long)]
        batch: bool,
        /// Include the explanation context of the first window
        #[arg(long)]
        explain: bool,
    },

    /// Score cost decisions against ground-truth class labels
    Evaluate {
        /// Pipeline configuration (TOML)
        #[arg(long, env = "RUL_CONFIG")]
        config: PathBuf,
        /// Readout CSV covering the labelled vehicles
        #[arg(long)]
        input: PathBuf,
        /// CSV with vehicle_id and class_label columns
        #[arg(long)]
        labels: PathBuf,
    },
}

fn load_service(config: &Path) -> Result<DecisionService> {
    let cfg = PipelineConfig::load(config)
        .with_context(|| format!("loading configuration {}", config.display()))?;
    DecisionService::from_config(cfg).context("loading artifacts")
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json)?;

    info!("=== RUL Decision Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let output = match args.command {
        Command::Decide {
            config,
            input,
            batch,
            explain,
        } => {
            let service = load_service(&config)?;
            let table = readout::read_csv(&input)
                .with_context(|| format!("reading readouts {}", input.display()))?;
            let mode = if batch {
                RequestMode::Batch
            } else {
                RequestMode::Interactive
            };
            serde_json::to_string_pretty(&service.decide(&table, mode, explain)?)?
        }
        Command::Evaluate {
            config,
            input,
            labels,
        } => {
            let service = load_service(&config)?;
            let table = readout::read_csv(&input)
                .with_context(|| format!("reading readouts {}", input.display()))?;
            let labels = read_labels(&labels)?;
            serde_json::to_string_pretty(&service.evaluate(&table, &labels)?)?
        }
    };

    println!("{output}");
    Ok(())
}
