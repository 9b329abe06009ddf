//! TOML configuration for the `pattern_map` binary.
//!
//! Every table and key is optional:
//!
//! ```toml
//! [analysis]
//! location_attribute = "fips"
//! name_attribute = "county"
//! parent_attribute = "state"
//! fail_fast = false
//!
//! [ingest]
//! max_dataset_bytes = 52428800
//! max_pattern_bytes = 1048576
//! ```

use std::path::Path;

use pattern_map_analytics_models::AnalysisConfig;
use pattern_map_ingest::IngestConfig;
use serde::Deserialize;

use crate::CliError;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attribute names and error policy for the analysis.
    pub analysis: AnalysisConfig,
    /// Upload limits and required columns.
    pub ingest: IngestConfig,
}

impl Config {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// * [`CliError::Config`] if the text is not valid TOML or has values of
    ///   the wrong type
    pub fn from_toml(text: &str) -> Result<Self, CliError> {
        toml::de::from_str(text).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Loads configuration from `path`, or the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// * [`CliError::Io`] if the file cannot be read
    /// * [`CliError::Config`] if the file cannot be parsed
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        log::debug!("Loaded configuration from {}", path.display());

        Ok(config)
    }
}
