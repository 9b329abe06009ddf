//! Constraint evaluation against dataset rows.

use pattern_map_analytics_models::{Constraint, ConstraintSet, Row, Value, cell};

/// Whether `row` satisfies every constraint in `constraints`.
///
/// An empty set matches every row. Unrestricted constraints (a range without
/// bounds, an empty allowed set) are skipped rather than failing the row.
#[must_use]
pub fn matches(row: &Row, constraints: &ConstraintSet) -> bool {
    constraints
        .iter()
        .all(|(attribute, constraint)| satisfies(cell(row, attribute), constraint))
}

/// Whether a single value satisfies a single constraint.
///
/// Numeric ranges are inclusive; absent bounds and the unbounded sentinels
/// place no restriction. Values that are missing or do not convert fail
/// closed.
#[must_use]
pub fn satisfies(value: &Value, constraint: &Constraint) -> bool {
    if constraint.is_unrestricted() {
        return true;
    }

    match constraint {
        Constraint::Numeric(range) => value
            .as_number()
            .is_some_and(|v| v >= range.min() && v <= range.max()),
        Constraint::Categorical(allowed) => {
            !value.is_missing()
                && value
                    .as_text()
                    .is_some_and(|text| allowed.values.contains(&text))
        }
    }
}

/// Rows satisfying `constraints`, in input order.
#[must_use]
pub fn filter<'a>(rows: &'a [Row], constraints: &ConstraintSet) -> Vec<&'a Row> {
    rows.iter().filter(|row| matches(row, constraints)).collect()
}

#[cfg(test)]
mod tests {
    use pattern_map_analytics_models::{LowerBound, UpperBound};

    use super::*;

    fn row(income: Value, region: Value) -> Row {
        let mut row = Row::new();
        row.insert("income".to_string(), income);
        row.insert("region".to_string(), region);
        row
    }

    fn set(pairs: Vec<(&str, Constraint)>) -> ConstraintSet {
        pairs
            .into_iter()
            .map(|(k, c)| (k.to_string(), c))
            .collect()
    }

    #[test]
    fn empty_set_keeps_everything_in_order() {
        let rows = vec![
            row(1.0.into(), "a".into()),
            row(Value::Null, Value::Null),
            row(3.0.into(), "c".into()),
        ];
        let kept = filter(&rows, &ConstraintSet::new());
        assert_eq!(kept.len(), 3);
        for (kept, original) in kept.iter().zip(&rows) {
            assert_eq!(*kept, original);
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let c = Constraint::range(
            Some(LowerBound::Finite(10.0)),
            Some(UpperBound::Finite(20.0)),
        );
        assert!(satisfies(&10.0.into(), &c));
        assert!(satisfies(&20.0.into(), &c));
        assert!(satisfies(&"15".into(), &c));
        assert!(!satisfies(&9.99.into(), &c));
        assert!(!satisfies(&20.01.into(), &c));
    }

    #[test]
    fn sentinels_and_absent_bounds_are_open() {
        let sentinel = Constraint::range(Some(LowerBound::Unbounded), Some(UpperBound::Finite(5.0)));
        let absent = Constraint::range(None, Some(UpperBound::Finite(5.0)));
        for value in [-1.0e12, 0.0, 5.0] {
            assert!(satisfies(&value.into(), &sentinel));
            assert!(satisfies(&value.into(), &absent));
        }
        assert!(!satisfies(&6.0.into(), &sentinel));
    }

    #[test]
    fn non_numeric_values_fail_numeric_constraints() {
        let c = Constraint::range(Some(LowerBound::Unbounded), Some(UpperBound::Unbounded));
        assert!(!satisfies(&Value::Null, &c));
        assert!(!satisfies(&"".into(), &c));
        assert!(!satisfies(&"abc".into(), &c));
        assert!(satisfies(&"0".into(), &c));
    }

    #[test]
    fn infinite_words_fail_bounded_constraints() {
        let at_least = Constraint::range(Some(LowerBound::Finite(10.0)), None);
        assert!(!satisfies(&"inf".into(), &at_least));
        assert!(!satisfies(&"Infinity".into(), &at_least));
        assert!(satisfies(&"12".into(), &at_least));
    }

    #[test]
    fn categorical_membership_uses_text_form() {
        let c = Constraint::one_of(["south", "3"]);
        assert!(satisfies(&"south".into(), &c));
        assert!(satisfies(&3.0.into(), &c));
        assert!(!satisfies(&"north".into(), &c));
        assert!(!satisfies(&Value::Null, &c));
    }

    #[test]
    fn empty_region_fails_categorical_constraint() {
        let c = Constraint::one_of(["south", ""]);
        assert!(!satisfies(&"".into(), &c));
    }

    #[test]
    fn unrestricted_constraints_are_skipped() {
        let constraints = set(vec![
            ("income", Constraint::range(None, None)),
            ("region", Constraint::one_of(Vec::<String>::new())),
        ]);
        assert!(matches(&row(Value::Null, Value::Null), &constraints));
    }

    #[test]
    fn all_constraints_must_hold() {
        let constraints = set(vec![
            ("income", Constraint::range(None, Some(UpperBound::Finite(50.0)))),
            ("region", Constraint::one_of(["south"])),
        ]);
        let rows = vec![
            row(10.0.into(), "south".into()),
            row(60.0.into(), "south".into()),
            row(10.0.into(), "west".into()),
        ];
        let kept = filter(&rows, &constraints);
        assert_eq!(kept, vec![&rows[0]]);
    }

    #[test]
    fn constraint_on_absent_attribute_fails() {
        let constraints = set(vec![(
            "population",
            Constraint::range(Some(LowerBound::Finite(0.0)), None),
        )]);
        assert!(!matches(&row(1.0.into(), "a".into()), &constraints));
    }
}
