//! Union of constraints recorded against the same attribute.
//!
//! When several patterns touch one location, their constraints on a shared
//! attribute are merged to describe "the location satisfies at least one of
//! these requirements".

use pattern_map_analytics_models::{
    CategoricalConstraint, Constraint, LowerBound, NumericConstraint, UpperBound,
};

/// Merges two constraints on the same attribute.
///
/// Equal inputs return the first operand. Numeric ranges merge with
/// [`merge_ranges`], categorical sets by union. Constraints of different
/// kinds cannot be merged and the first operand is returned unchanged.
#[must_use]
pub fn merge(a: &Constraint, b: &Constraint) -> Constraint {
    if a == b {
        return a.clone();
    }

    match (a, b) {
        (Constraint::Numeric(x), Constraint::Numeric(y)) => Constraint::Numeric(merge_ranges(x, y)),
        (Constraint::Categorical(x), Constraint::Categorical(y)) => {
            Constraint::Categorical(CategoricalConstraint {
                values: x.values.union(&y.values).cloned().collect(),
            })
        }
        _ => {
            log::debug!("Cannot merge constraints of different kinds, keeping the first");
            a.clone()
        }
    }
}

/// Smallest range covering both inputs.
#[must_use]
pub fn merge_ranges(a: &NumericConstraint, b: &NumericConstraint) -> NumericConstraint {
    NumericConstraint {
        lb: merge_lower(a.lb, b.lb),
        ub: merge_upper(a.ub, b.ub),
    }
}

/// Value given to a merged bound when neither operand specified it.
///
/// Note this is a concrete `0`, not "unbounded". Existing consumers expect
/// it; changing the meaning of an absent merged bound is a change here only.
#[must_use]
pub const fn absent_bound_fallback() -> f64 {
    0.0
}

fn merge_lower(a: Option<LowerBound>, b: Option<LowerBound>) -> Option<LowerBound> {
    match (a, b) {
        (Some(LowerBound::Unbounded), _) | (_, Some(LowerBound::Unbounded)) => {
            Some(LowerBound::Unbounded)
        }
        (Some(bound), None) | (None, Some(bound)) => Some(bound),
        (None, None) => Some(LowerBound::Finite(absent_bound_fallback())),
        (Some(LowerBound::Finite(x)), Some(LowerBound::Finite(y))) => {
            Some(LowerBound::Finite(x.min(y)))
        }
    }
}

fn merge_upper(a: Option<UpperBound>, b: Option<UpperBound>) -> Option<UpperBound> {
    match (a, b) {
        (Some(UpperBound::Unbounded), _) | (_, Some(UpperBound::Unbounded)) => {
            Some(UpperBound::Unbounded)
        }
        (Some(bound), None) | (None, Some(bound)) => Some(bound),
        (None, None) => Some(UpperBound::Finite(absent_bound_fallback())),
        (Some(UpperBound::Finite(x)), Some(UpperBound::Finite(y))) => {
            Some(UpperBound::Finite(x.max(y)))
        }
    }
}
