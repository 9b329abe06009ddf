#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data model for the pattern map analytics engine.
//!
//! These types describe everything that flows in and out of the engine:
//! loosely-typed dataset [`Row`]s, per-attribute [`AttributeStats`], mined
//! [`PatternDefinition`]s with their [`ConstraintSet`], the enriched
//! [`Pattern`] results and the per-location [`LocationSummary`] rollups.
//! All of them serialize to plain JSON maps, sequences, numbers and strings.

pub mod constraint;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use constraint::{
    CategoricalConstraint, Constraint, ConstraintKind, ConstraintSet, LowerBound,
    NumericConstraint, UpperBound,
};

/// Numeric location identifier (e.g. a county FIPS code).
pub type LocationId = i64;

/// Unique identifier of a mined pattern.
pub type PatternId = i64;

/// One dataset record, keyed by attribute name.
pub type Row = BTreeMap<String, Value>;

/// Per-attribute statistics for one dataset or dataset subset.
pub type DataSummary = BTreeMap<String, AttributeStats>;

/// A scalar cell value.
///
/// Serialized untagged, so a row reads as a plain JSON object of numbers,
/// strings and nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A numeric cell.
    Number(f64),
    /// A textual cell.
    Text(String),
    /// A missing cell.
    Null,
}

static NULL: Value = Value::Null;

impl Value {
    /// Numeric form of the value, if it has one.
    ///
    /// Text is trimmed and parsed as `f64`. Null, empty text, unparseable
    /// text and non-finite numbers (`NaN`, `inf`, `-Infinity`) all yield
    /// `None`.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            Self::Number(_) | Self::Null => None,
        }
    }

    /// Textual form of the value, used as the key for categorical counts and
    /// membership checks.
    ///
    /// Whole numbers print without a fractional part (`10`, not `10.0`).
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) if n.is_infinite() => Some(
                if n.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                }
                .to_string(),
            ),
            Self::Number(n) => Some(n.to_string()),
            Self::Null => None,
        }
    }

    /// Whether the value is null or an empty string.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Looks up an attribute in a row, treating an absent key as [`Value::Null`].
#[must_use]
pub fn cell<'a>(row: &'a Row, attribute: &str) -> &'a Value {
    row.get(attribute).unwrap_or(&NULL)
}

/// Descriptive statistics for one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeStats {
    /// The attribute holds numbers.
    Numeric(NumericStats),
    /// The attribute holds category labels.
    Categorical(CategoricalStats),
}

impl AttributeStats {
    /// Returns the numeric stats, if this is a numeric attribute.
    #[must_use]
    pub const fn as_numeric(&self) -> Option<&NumericStats> {
        match self {
            Self::Numeric(stats) => Some(stats),
            Self::Categorical(_) => None,
        }
    }

    /// Returns the categorical stats, if this is a categorical attribute.
    #[must_use]
    pub const fn as_categorical(&self) -> Option<&CategoricalStats> {
        match self {
            Self::Categorical(stats) => Some(stats),
            Self::Numeric(_) => None,
        }
    }
}

/// Mean, minimum and maximum of a numeric attribute.
///
/// All three are `NaN` when the attribute has no valid numeric values.
/// `NaN` serializes as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    /// Arithmetic mean.
    #[serde(with = "nan_as_null")]
    pub mean: f64,
    /// Smallest value.
    #[serde(with = "nan_as_null")]
    pub min: f64,
    /// Largest value.
    #[serde(with = "nan_as_null")]
    pub max: f64,
}

impl NumericStats {
    /// Stats for an attribute without any numeric values.
    pub const EMPTY: Self = Self {
        mean: f64::NAN,
        min: f64::NAN,
        max: f64::NAN,
    };
}

/// Occurrence counts of a categorical attribute, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalStats {
    /// Distinct values with their counts, sorted by count descending. Ties
    /// keep the order in which the values were first seen.
    pub categories: Vec<CategoryCount>,
}

/// Count of a single categorical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Category label.
    pub value: String,
    /// Number of rows carrying the label.
    pub count: u64,
}

/// A mined pattern as parsed from its raw record, before analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDefinition {
    /// Pattern identifier (`ID` in the description).
    pub id: PatternId,
    /// Attribute constraints a row must satisfy to match.
    pub constraints: ConstraintSet,
    /// Name of the target attribute.
    pub target: String,
    /// Mean of the target attribute over the rows the pattern was mined from.
    #[serde(with = "nan_as_null")]
    pub target_mean: f64,
}

/// A pattern enriched with the rows it matches in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    /// Pattern identifier.
    pub id: PatternId,
    /// Attribute constraints a row must satisfy to match.
    pub constraints: ConstraintSet,
    /// Name of the target attribute.
    pub target: String,
    /// Mean of the target attribute reported by the miner.
    #[serde(with = "nan_as_null")]
    pub target_mean: f64,
    /// Number of dataset rows matching the constraints.
    pub row_count: u64,
    /// Statistics over the matching rows. Empty when nothing matched.
    pub summary: DataSummary,
    /// Locations of the matching rows, in dataset order, without repeats.
    pub locations: Vec<LocationId>,
}

impl Pattern {
    /// Enriches a definition with its analysis results.
    #[must_use]
    pub fn from_definition(
        definition: PatternDefinition,
        row_count: u64,
        summary: DataSummary,
        locations: Vec<LocationId>,
    ) -> Self {
        Self {
            id: definition.id,
            constraints: definition.constraints,
            target: definition.target,
            target_mean: definition.target_mean,
            row_count,
            summary,
            locations,
        }
    }
}

/// A constraint recorded against a location, with the number of times
/// matching pattern rows touched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConstraint {
    /// Number of matching pattern rows that constrained this attribute.
    pub count: u64,
    /// Union of every constraint recorded for the attribute.
    pub constraint: Constraint,
}

/// Rollup of every pattern that matched a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    /// Location name (e.g. county).
    pub name: String,
    /// Parent location name (e.g. state).
    pub parent_name: String,
    /// Sum of the target values of every matching pattern row.
    pub target_value: f64,
    /// Number of target values summed into `target_value`.
    pub contributions: u64,
    /// Patterns that matched at least one row here, first match first.
    pub patterns: Vec<PatternId>,
    /// Merged constraints per attribute.
    pub constraints: BTreeMap<String, LocationConstraint>,
}

impl LocationSummary {
    /// Creates an untouched summary.
    #[must_use]
    pub fn new(name: impl Into<String>, parent_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_name: parent_name.into(),
            target_value: 0.0,
            contributions: 0,
            patterns: Vec::new(),
            constraints: BTreeMap::new(),
        }
    }

    /// Mean of the accumulated target values, or `None` if nothing was
    /// accumulated.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn target_mean(&self) -> Option<f64> {
        (self.contributions > 0).then(|| self.target_value / self.contributions as f64)
    }
}

/// Output of analyzing a pattern list against a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Enriched patterns, in input order.
    pub patterns: Vec<Pattern>,
    /// One summary per location id present in the dataset.
    pub locations: BTreeMap<LocationId, LocationSummary>,
    /// Target attribute of the last pattern that matched any rows.
    pub target: String,
}

/// A pattern record that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternErrorReport {
    /// Zero-based index of the raw pattern record.
    pub row: usize,
    /// Human-readable reason.
    pub message: String,
}

/// Everything the presentation layer needs for one dataset/pattern upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResult {
    /// Statistics over the whole dataset.
    pub data_summary: DataSummary,
    /// Statistics per parent location (e.g. per state).
    pub parent_location_summary: BTreeMap<String, DataSummary>,
    /// Enriched patterns.
    pub patterns: Vec<Pattern>,
    /// Per-location rollups.
    pub locations: BTreeMap<LocationId, LocationSummary>,
    /// Target attribute.
    pub target: String,
    /// Pattern records skipped because they could not be parsed.
    pub pattern_errors: Vec<PatternErrorReport>,
    /// When the result was computed (RFC 3339, UTC).
    pub computed_at: String,
}

/// Which dataset columns play the location roles, and how strictly pattern
/// records are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Column holding the numeric location id.
    pub location_attribute: String,
    /// Column holding the location name.
    pub name_attribute: String,
    /// Column holding the parent location name.
    pub parent_attribute: String,
    /// Abort on the first malformed pattern record instead of skipping it.
    pub fail_fast: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            location_attribute: "fips".to_string(),
            name_attribute: "county".to_string(),
            parent_attribute: "state".to_string(),
            fail_fast: false,
        }
    }
}

/// Serializes `NaN` as `null` and reads `null` back as `NaN`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
