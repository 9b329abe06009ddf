#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the pattern map analytics engine.
//!
//! Validates a dataset/pattern CSV pair, runs the full computation and
//! writes the result as JSON for a map front end to render.
//!
//! Uses `indicatif-log-bridge` (via [`pattern_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the progress bar never fight for the terminal.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pattern_map_analytics::AnalyticsError;
use pattern_map_cli_utils::IndicatifProgress;
use pattern_map_ingest::IngestError;
use thiserror::Error;

use crate::config::Config;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Loading an input file failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The computation failed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file is invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// The upload failed its pre-checks.
    #[error("Upload rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),
}

#[derive(Parser)]
#[command(name = "pattern_map", about = "Pattern analytics for location-keyed datasets")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, parse and analyze a dataset against a pattern file
    Compute {
        /// Dataset CSV (one row per location)
        #[arg(long)]
        dataset: PathBuf,
        /// Pattern CSV (one mined pattern per row)
        #[arg(long)]
        patterns: PathBuf,
        /// Write the JSON result here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },
    /// Print per-attribute statistics for a dataset
    Summarize {
        /// Dataset CSV
        #[arg(long)]
        dataset: PathBuf,
        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },
    /// Run the upload pre-checks only
    Validate {
        /// Dataset CSV
        #[arg(long)]
        dataset: PathBuf,
        /// Pattern CSV
        #[arg(long)]
        patterns: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = pattern_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Compute {
            dataset,
            patterns,
            output,
            pretty,
        } => {
            let progress = IndicatifProgress::steps_bar(&multi, "Computing");
            let report = commands::compute(&dataset, &patterns, &config, progress.as_ref())?;

            for error in &report.result.pattern_errors {
                log::warn!("Pattern row {}: {}", error.row, error.message);
            }

            commands::write_json(&report, output.as_deref(), pretty)?;
        }
        Commands::Summarize { dataset, pretty } => {
            let summary = commands::summarize(&dataset)?;
            commands::write_json(&summary, None, pretty)?;
        }
        Commands::Validate { dataset, patterns } => {
            let (_, _, report) = commands::validate(&dataset, &patterns, &config)?;
            if !report.is_success() {
                for error in &report.errors {
                    log::error!("{error}");
                }
                return Err(CliError::Rejected(report.errors).into());
            }
            log::info!("Both files passed validation.");
        }
    }

    Ok(())
}
