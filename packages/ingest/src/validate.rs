//! Pre-checks for uploaded dataset and pattern files.
//!
//! These run before any CSV parsing and only look at file names, sizes and
//! header rows. Every problem found is collected so the user can fix them
//! all in one go.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::{IngestConfig, IngestError};

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// File metadata.
    pub metadata: FileMetadata,
    /// Full text content.
    pub content: String,
}

/// Descriptive metadata of an input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// File name without directories.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time (RFC 3339), when the platform reports one.
    pub last_modified: Option<String>,
}

impl InputFile {
    /// Reads a file from disk.
    ///
    /// # Errors
    ///
    /// * [`IngestError::Io`] if the file or its metadata cannot be read
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let meta = std::fs::metadata(path)?;
        let content = std::fs::read_to_string(path)?;
        let last_modified = meta.modified().ok().map(|time| {
            DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
        });

        Ok(Self {
            metadata: FileMetadata {
                name: path
                    .file_name()
                    .map_or_else(String::new, |n| n.to_string_lossy().into_owned()),
                size: meta.len(),
                last_modified,
            },
            content,
        })
    }

    /// Wraps in-memory text under the given name.
    #[must_use]
    pub fn from_text(name: &str, content: &str) -> Self {
        Self {
            metadata: FileMetadata {
                name: name.to_owned(),
                size: content.len() as u64,
                last_modified: None,
            },
            content: content.to_owned(),
        }
    }
}

/// Outcome of [`validate_inputs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Problems that prevent processing.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Whether the inputs passed every check.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks a dataset/pattern upload before processing.
///
/// Both files must be present, named `*.csv`, within the configured size
/// limits, have a comma-separated header plus at least one data row, and
/// carry the configured required columns. Content checks only run when the
/// presence, name and size checks pass.
#[must_use]
pub fn validate_inputs(
    dataset: Option<&InputFile>,
    patterns: Option<&InputFile>,
    config: &IngestConfig,
) -> ValidationReport {
    let mut errors = Vec::new();

    if dataset.is_none() {
        errors.push("Dataset file is required".to_owned());
    }
    if patterns.is_none() {
        errors.push("Pattern file is required".to_owned());
    }

    let (Some(dataset), Some(patterns)) = (dataset, patterns) else {
        return ValidationReport { errors };
    };

    check_file(&mut errors, dataset, "Dataset", config.max_dataset_bytes);
    check_file(&mut errors, patterns, "Pattern", config.max_pattern_bytes);

    if errors.is_empty() {
        check_content(
            &mut errors,
            dataset,
            "Dataset",
            &config.required_dataset_columns,
        );
        check_content(
            &mut errors,
            patterns,
            "Pattern",
            &config.required_pattern_columns,
        );
    }

    if !errors.is_empty() {
        log::debug!("Upload rejected: {}", errors.join("; "));
    }

    ValidationReport { errors }
}

fn check_file(errors: &mut Vec<String>, file: &InputFile, label: &str, max_bytes: u64) {
    if !file.metadata.name.to_lowercase().ends_with(".csv") {
        errors.push(format!("{label} file must be a CSV file"));
    }
    if file.metadata.size > max_bytes {
        errors.push(format!(
            "{label} file is too large (max {})",
            human_size(max_bytes)
        ));
    }
}

fn check_content(errors: &mut Vec<String>, file: &InputFile, label: &str, required: &[String]) {
    let lines: Vec<&str> = file
        .content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        errors.push(format!(
            "{label} file must contain at least a header and one data row"
        ));
    }

    let Some(header) = lines.first() else {
        return;
    };

    if !header.contains(',') {
        errors.push(format!(
            "{label} file does not appear to be a valid CSV format"
        ));
    }

    let columns = header_columns(header);
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !columns.contains(column))
        .map(|column| format!("\"{column}\""))
        .collect();

    if !missing.is_empty() {
        errors.push(format!(
            "{label} file is missing required columns: {}",
            missing.join(", ")
        ));
    }
}

/// Header names as the CSV reader will see them (trimmed, lower-cased).
fn header_columns(header: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(header.as_bytes());

    reader
        .records()
        .next()
        .and_then(Result::ok)
        .map(|record| record.iter().map(str::to_lowercase).collect())
        .unwrap_or_default()
}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{bytes} bytes")
    }
}
