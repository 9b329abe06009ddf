//! Attribute constraints attached to mined patterns.
//!
//! A [`Constraint`] is either a numeric range or a categorical membership
//! set. Numeric bounds distinguish "absent" (`None`) from the explicit
//! unbounded sentinels `"-inf"` / `"inf"`; the evaluator treats both as no
//! restriction, but the merge rules do not.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::Value;

/// Constraints keyed by attribute name. Absent attributes are unconstrained.
pub type ConstraintSet = BTreeMap<String, Constraint>;

/// A restriction on the values of one attribute.
///
/// Serialized untagged: `{"lb": .., "ub": ..}` for numeric ranges and
/// `{"in": [..]}` for categorical sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constraint {
    /// Allowed category labels.
    Categorical(CategoricalConstraint),
    /// Inclusive numeric range.
    Numeric(NumericConstraint),
}

/// The two constraint kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Numeric range.
    Numeric,
    /// Categorical membership.
    Categorical,
}

impl Constraint {
    /// Builds a numeric range constraint.
    #[must_use]
    pub const fn range(lb: Option<LowerBound>, ub: Option<UpperBound>) -> Self {
        Self::Numeric(NumericConstraint { lb, ub })
    }

    /// Builds a categorical membership constraint.
    #[must_use]
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Categorical(CategoricalConstraint {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Which kind of constraint this is.
    #[must_use]
    pub const fn kind(&self) -> ConstraintKind {
        match self {
            Self::Numeric(_) => ConstraintKind::Numeric,
            Self::Categorical(_) => ConstraintKind::Categorical,
        }
    }

    /// Whether the constraint carries no restriction at all: a range with
    /// neither bound present, or an empty allowed set. Such constraints are
    /// skipped during evaluation.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        match self {
            Self::Numeric(c) => c.lb.is_none() && c.ub.is_none(),
            Self::Categorical(c) => c.values.is_empty(),
        }
    }
}

/// Inclusive numeric range. Either bound may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumericConstraint {
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb: Option<LowerBound>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ub: Option<UpperBound>,
}

impl NumericConstraint {
    /// Lower bound as a number; absent or unbounded resolves to `-inf`.
    #[must_use]
    pub fn min(&self) -> f64 {
        match self.lb {
            Some(LowerBound::Finite(v)) => v,
            Some(LowerBound::Unbounded) | None => f64::NEG_INFINITY,
        }
    }

    /// Upper bound as a number; absent or unbounded resolves to `+inf`.
    #[must_use]
    pub fn max(&self) -> f64 {
        match self.ub {
            Some(UpperBound::Finite(v)) => v,
            Some(UpperBound::Unbounded) | None => f64::INFINITY,
        }
    }
}

/// Set of allowed category labels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoricalConstraint {
    /// Allowed labels. Numbers in the source are stored in their text form.
    #[serde(rename = "in", deserialize_with = "labels")]
    pub values: BTreeSet<String>,
}

/// Lower end of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBound", into = "RawBound")]
pub enum LowerBound {
    /// The `"-inf"` sentinel.
    Unbounded,
    /// A concrete bound.
    Finite(f64),
}

/// Upper end of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBound", into = "RawBound")]
pub enum UpperBound {
    /// The `"inf"` sentinel.
    Unbounded,
    /// A concrete bound.
    Finite(f64),
}

/// Wire form of a bound: a number or a sentinel string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawBound {
    Number(f64),
    Text(String),
}

fn finite_bound(text: &str) -> Result<f64, String> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid bound: {text:?}"))
}

impl TryFrom<RawBound> for LowerBound {
    type Error = String;

    fn try_from(raw: RawBound) -> Result<Self, Self::Error> {
        match raw {
            RawBound::Number(v) => Ok(Self::Finite(v)),
            RawBound::Text(s) if s == "-inf" => Ok(Self::Unbounded),
            RawBound::Text(s) => finite_bound(&s).map(Self::Finite),
        }
    }
}

impl TryFrom<RawBound> for UpperBound {
    type Error = String;

    fn try_from(raw: RawBound) -> Result<Self, Self::Error> {
        match raw {
            RawBound::Number(v) => Ok(Self::Finite(v)),
            RawBound::Text(s) if s == "inf" => Ok(Self::Unbounded),
            RawBound::Text(s) => finite_bound(&s).map(Self::Finite),
        }
    }
}

impl From<LowerBound> for RawBound {
    fn from(bound: LowerBound) -> Self {
        match bound {
            LowerBound::Unbounded => Self::Text("-inf".to_string()),
            LowerBound::Finite(v) => Self::Number(v),
        }
    }
}

impl From<UpperBound> for RawBound {
    fn from(bound: UpperBound) -> Self {
        match bound {
            UpperBound::Unbounded => Self::Text("inf".to_string()),
            UpperBound::Finite(v) => Self::Number(v),
        }
    }
}

/// Reads a JSON array of labels, accepting numbers as well as strings and
/// dropping nulls.
fn labels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(Value::as_text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_constraint_with_sentinel() {
        let c: Constraint = serde_json::from_str(r#"{"lb": "-inf", "ub": 50000}"#).unwrap();
        assert_eq!(
            c,
            Constraint::range(
                Some(LowerBound::Unbounded),
                Some(UpperBound::Finite(50000.0))
            )
        );
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            serde_json::json!({"lb": "-inf", "ub": 50000.0})
        );
    }

    #[test]
    fn categorical_constraint_accepts_numbers() {
        let c: Constraint = serde_json::from_str(r#"{"in": ["urban", 3, null]}"#).unwrap();
        assert_eq!(c, Constraint::one_of(["3", "urban"]));
        assert_eq!(c.kind(), ConstraintKind::Categorical);
    }

    #[test]
    fn one_sided_and_empty_ranges() {
        let c: Constraint = serde_json::from_str(r#"{"ub": 10}"#).unwrap();
        assert_eq!(c, Constraint::range(None, Some(UpperBound::Finite(10.0))));
        assert!(!c.is_unrestricted());

        let empty: Constraint = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.kind(), ConstraintKind::Numeric);
        assert!(empty.is_unrestricted());
        assert!(Constraint::one_of(Vec::<String>::new()).is_unrestricted());
    }

    #[test]
    fn misplaced_sentinel_is_rejected() {
        assert!(serde_json::from_str::<Constraint>(r#"{"lb": "inf"}"#).is_err());
        assert!(serde_json::from_str::<Constraint>(r#"{"ub": "-inf"}"#).is_err());
        assert!(serde_json::from_str::<Constraint>(r#"{"lb": "ten"}"#).is_err());
    }

    #[test]
    fn numeric_strings_are_bounds() {
        let c: Constraint = serde_json::from_str(r#"{"lb": "2.5"}"#).unwrap();
        assert_eq!(c, Constraint::range(Some(LowerBound::Finite(2.5)), None));
    }

    #[test]
    fn resolved_bounds() {
        let open = NumericConstraint::default();
        assert!(open.min().is_infinite() && open.min() < 0.0);
        assert!(open.max().is_infinite() && open.max() > 0.0);

        let sentinel = NumericConstraint {
            lb: Some(LowerBound::Unbounded),
            ub: Some(UpperBound::Finite(3.0)),
        };
        assert_eq!(sentinel.min(), f64::NEG_INFINITY);
        assert!((sentinel.max() - 3.0).abs() < f64::EPSILON);
    }
}
