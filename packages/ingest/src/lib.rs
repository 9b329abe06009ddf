#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV loading and upload pre-checks.
//!
//! Turns uploaded dataset and pattern files into the loosely-typed
//! [`Row`](pattern_map_analytics_models::Row) records the analytics engine
//! consumes, and rejects uploads that are obviously not what the engine
//! expects before any parsing happens.

pub mod reader;
pub mod validate;

use serde::Deserialize;
use thiserror::Error;

pub use reader::{parse_csv, read_csv_file};
pub use validate::{FileMetadata, InputFile, ValidationReport, validate_inputs};

/// Errors that can occur while loading input files.
#[derive(Debug, Error)]
pub enum IngestError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file content is not usable.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Limits and required columns for uploaded files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Largest accepted dataset file, in bytes.
    pub max_dataset_bytes: u64,
    /// Largest accepted pattern file, in bytes.
    pub max_pattern_bytes: u64,
    /// Columns every dataset must have.
    pub required_dataset_columns: Vec<String>,
    /// Columns every pattern file must have.
    pub required_pattern_columns: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_dataset_bytes: 50 * 1024 * 1024,
            max_pattern_bytes: 1024 * 1024,
            required_dataset_columns: to_strings(&["fips", "county", "state"]),
            required_pattern_columns: to_strings(&[
                "keys",
                "description",
                "target",
                "count",
                "mean",
                "std",
                "min",
                "max",
            ]),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
