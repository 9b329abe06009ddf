//! Mined pattern record parsing.
//!
//! Pattern miners emit their descriptions as Python dict literals, e.g.
//! `{'ID': 3, 'constraints': {'income': {'lb': -inf, 'ub': 50000}}}`.
//! [`sanitize_description`] rewrites that into JSON before decoding.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use pattern_map_analytics_models::{Constraint, ConstraintSet, PatternDefinition, Row, cell};
use regex::Regex;
use thiserror::Error;

/// A bare `inf` / `-inf` token used as an object value.
static INF_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(:\s*)(-?inf)\b").expect("valid regex"));

/// Why a single pattern record could not be parsed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The sanitized description is not valid JSON.
    #[error("Invalid pattern description: {source}")]
    InvalidDescription {
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A required field is absent.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field is present but has the wrong shape.
    #[error("Invalid field {field}: {message}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Description of what went wrong.
        message: String,
    },
}

/// A [`ParseError`] tagged with the record it came from.
#[derive(Debug, Error)]
#[error("Pattern record {row}: {error}")]
pub struct PatternError {
    /// Zero-based index of the raw pattern record.
    pub row: usize,
    /// What went wrong.
    #[source]
    pub error: ParseError,
}

/// Turns a Python-style description into JSON text.
///
/// Bare `-inf` / `inf` values become the quoted sentinels `"-inf"` / `"inf"`,
/// then every single quote becomes a double quote.
#[must_use]
pub fn sanitize_description(raw: &str) -> String {
    INF_VALUE_RE
        .replace_all(raw, "${1}'${2}'")
        .replace('\'', "\"")
}

/// Parses one raw pattern record.
///
/// The record needs a `description` holding `ID` and `constraints`. `target`
/// names the target attribute and is empty when absent. `mean` is read as the
/// target mean; a missing or non-numeric mean becomes `NaN`. Constraints whose
/// value is `null` are dropped.
///
/// # Errors
///
/// * [`ParseError::MissingField`] if `description`, `ID` or `constraints` is
///   absent
/// * [`ParseError::InvalidDescription`] if the sanitized description is not
///   valid JSON
/// * [`ParseError::InvalidField`] if `ID` is not an integer or a constraint
///   is malformed
pub fn parse_pattern(record: &Row) -> Result<PatternDefinition, ParseError> {
    let description = required_text(record, "description")?;
    let target = cell(record, "target").as_text().unwrap_or_default();

    let sanitized = sanitize_description(&description);
    let json: serde_json::Value = serde_json::from_str(&sanitized)
        .map_err(|source| ParseError::InvalidDescription { source })?;

    let id_value = json
        .get("ID")
        .ok_or(ParseError::MissingField { field: "ID" })?;
    let id = integer_id(id_value).ok_or_else(|| ParseError::InvalidField {
        field: "ID",
        message: format!("expected an integer, got {id_value}"),
    })?;

    let constraints_value = json
        .get("constraints")
        .ok_or(ParseError::MissingField {
            field: "constraints",
        })?;
    let raw: BTreeMap<String, Option<Constraint>> =
        serde_json::from_value(constraints_value.clone()).map_err(|e| {
            ParseError::InvalidField {
                field: "constraints",
                message: e.to_string(),
            }
        })?;
    let constraints: ConstraintSet = raw
        .into_iter()
        .filter_map(|(attribute, constraint)| constraint.map(|c| (attribute, c)))
        .collect();

    let target_mean = cell(record, "mean").as_number().unwrap_or(f64::NAN);

    Ok(PatternDefinition {
        id,
        constraints,
        target,
        target_mean,
    })
}

/// Parses every record independently, so one malformed record does not
/// affect the others. Results are in input order.
#[must_use]
pub fn parse_patterns(records: &[Row]) -> Vec<Result<PatternDefinition, PatternError>> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| parse_pattern(record).map_err(|error| PatternError { row, error }))
        .collect()
}

fn required_text(record: &Row, field: &'static str) -> Result<String, ParseError> {
    let value = cell(record, field);
    if value.is_missing() {
        return Err(ParseError::MissingField { field });
    }
    value.as_text().ok_or(ParseError::MissingField { field })
}

#[allow(clippy::cast_possible_truncation)]
fn integer_id(value: &serde_json::Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.fract() == 0.0 && v.abs() < 9.0e15)
            .map(|v| v as i64)
    })
}
