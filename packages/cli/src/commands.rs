//! Subcommand implementations.

use std::path::Path;

use pattern_map_analytics::progress::ProgressCallback;
use pattern_map_analytics_models::{ComputeResult, DataSummary};
use pattern_map_ingest::{FileMetadata, InputFile, ValidationReport, parse_csv, validate_inputs};
use serde::Serialize;

use crate::CliError;
use crate::config::Config;

/// Output of the `compute` subcommand.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeReport {
    /// Metadata of the dataset that was analyzed.
    pub dataset_file: FileMetadata,
    /// Metadata of the pattern file that was analyzed.
    pub pattern_file: FileMetadata,
    #[serde(flatten)]
    pub result: ComputeResult,
}

/// Reads both input files and runs the upload pre-checks.
///
/// # Errors
///
/// * [`CliError::Ingest`] if either file cannot be read
pub fn validate(
    dataset: &Path,
    patterns: &Path,
    config: &Config,
) -> Result<(InputFile, InputFile, ValidationReport), CliError> {
    let dataset = InputFile::from_path(dataset)?;
    let patterns = InputFile::from_path(patterns)?;
    let report = validate_inputs(Some(&dataset), Some(&patterns), &config.ingest);

    Ok((dataset, patterns, report))
}

/// Validates, parses and analyzes a dataset/pattern pair.
///
/// # Errors
///
/// * [`CliError::Rejected`] if the upload fails the pre-checks
/// * [`CliError::Ingest`] if either file cannot be read or parsed
/// * [`CliError::Analytics`] if the computation fails
pub fn compute(
    dataset: &Path,
    patterns: &Path,
    config: &Config,
    progress: &dyn ProgressCallback,
) -> Result<ComputeReport, CliError> {
    let (dataset, patterns, report) = validate(dataset, patterns, config)?;
    if !report.is_success() {
        return Err(CliError::Rejected(report.errors));
    }

    let rows = parse_csv(&dataset.content)?;
    let records = parse_csv(&patterns.content)?;
    log::info!(
        "Loaded {} dataset row(s) from {} and {} pattern record(s) from {}",
        rows.len(),
        dataset.metadata.name,
        records.len(),
        patterns.metadata.name
    );

    let result = pattern_map_analytics::compute(&rows, &records, &config.analysis, progress)?;

    Ok(ComputeReport {
        dataset_file: dataset.metadata,
        pattern_file: patterns.metadata,
        result,
    })
}

/// Loads a dataset and summarizes its attributes.
///
/// # Errors
///
/// * [`CliError::Ingest`] if the file cannot be read or parsed
pub fn summarize(dataset: &Path) -> Result<DataSummary, CliError> {
    let rows = pattern_map_ingest::read_csv_file(dataset)?;
    Ok(pattern_map_analytics::summarize(&rows))
}

/// Serializes `value` as JSON and writes it to `output`, or stdout.
///
/// # Errors
///
/// * [`CliError::Json`] if serialization fails
/// * [`CliError::Io`] if the output file cannot be written
pub fn write_json<T: Serialize>(
    value: &T,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pattern_map_analytics::progress::NullProgress;

    use super::*;

    const DATASET: &str = "fips,county,state,income\n\
                           1,A,S1,10\n\
                           2,B,S1,60\n\
                           3,C,S2,40\n";
    const PATTERNS: &str = "keys,description,target,count,mean,std,min,max\n\
                            income,\"{'ID': 7, 'constraints': {'income': {'lb': -inf, 'ub': 50}}}\",income,2,25,15,10,40\n";

    fn write_inputs(dir: &Path, dataset: &str, patterns: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let dataset_path = dir.join("data.csv");
        let pattern_path = dir.join("patterns.csv");
        std::fs::write(&dataset_path, dataset).unwrap();
        std::fs::write(&pattern_path, patterns).unwrap();
        (dataset_path, pattern_path)
    }

    #[test]
    fn compute_produces_a_flattened_report() {
        let dir = tempfile::tempdir().unwrap();
        let (dataset, patterns) = write_inputs(dir.path(), DATASET, PATTERNS);

        let report = compute(&dataset, &patterns, &Config::default(), &NullProgress).unwrap();
        assert_eq!(report.dataset_file.name, "data.csv");
        assert_eq!(report.result.patterns.len(), 1);
        assert_eq!(report.result.patterns[0].locations, vec![1, 3]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["patternFile"]["name"], "patterns.csv");
        assert_eq!(json["target"], "income");
        assert!(json.get("result").is_none());
        assert!(json["locations"]["1"].is_object());
    }

    #[test]
    fn rejected_uploads_list_every_problem() {
        let dir = tempfile::tempdir().unwrap();
        let (dataset, patterns) = write_inputs(dir.path(), "fips\n1\n", PATTERNS);

        let err = compute(&dataset, &patterns, &Config::default(), &NullProgress).unwrap_err();
        let CliError::Rejected(errors) = err else {
            panic!("expected the upload to be rejected");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn summarize_reads_and_types_columns() {
        let dir = tempfile::tempdir().unwrap();
        let (dataset, _) = write_inputs(dir.path(), DATASET, PATTERNS);

        let summary = summarize(&dataset).unwrap();
        assert!(summary["income"].as_numeric().is_some());
        assert!(summary["county"].as_categorical().is_some());
    }

    #[test]
    fn json_is_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_json(&vec![1, 2, 3], Some(&path), false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1,2,3]");
    }
}
