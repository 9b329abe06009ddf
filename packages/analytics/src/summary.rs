//! Attribute type inference and descriptive statistics.
//!
//! [`summarize`] is a pure function of its rows and carries no state between
//! calls, so it is invoked once for the whole dataset, once per pattern
//! subset and once per parent-location group.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

use pattern_map_analytics_models::{
    AttributeStats, CategoricalStats, CategoryCount, DataSummary, NumericStats, Row, Value, cell,
};

/// Computes one [`AttributeStats`] for every attribute that appears in any
/// of the rows. Rows lacking an attribute contribute a null value.
#[must_use]
pub fn summarize<R: Borrow<Row>>(rows: &[R]) -> DataSummary {
    let attributes: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.borrow().keys().map(String::as_str))
        .collect();

    attributes
        .into_iter()
        .map(|attribute| {
            let values: Vec<&Value> = rows
                .iter()
                .map(|row| cell(row.borrow(), attribute))
                .collect();
            (attribute.to_string(), summarize_values(&values))
        })
        .collect()
}

/// Classifies one column and computes the matching statistics.
#[must_use]
pub fn summarize_values(values: &[&Value]) -> AttributeStats {
    if is_numeric_column(values) {
        AttributeStats::Numeric(numeric_stats(values))
    } else {
        AttributeStats::Categorical(categorical_stats(values))
    }
}

/// Whether a column should be summarized as numeric.
///
/// Permissive on purpose: a single value that converts to a number makes the
/// whole column numeric. Downstream consumers depend on this classification,
/// so tightening it to a majority threshold changes their output.
#[must_use]
pub fn is_numeric_column(values: &[&Value]) -> bool {
    values.iter().any(|value| value.as_number().is_some())
}

/// Mean, min and max over the values that convert to numbers. Everything
/// else is ignored.
#[must_use]
pub fn numeric_stats(values: &[&Value]) -> NumericStats {
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_number()).collect();
    if numbers.is_empty() {
        return NumericStats::EMPTY;
    }

    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    #[allow(clippy::cast_precision_loss)]
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;

    // Rounding in the sum can push the mean a ulp outside the observed range.
    let mean = if mean.is_nan() { mean } else { mean.clamp(min, max) };

    NumericStats { mean, min, max }
}

/// Occurrence counts of every non-missing value, most frequent first.
/// Equal counts keep first-seen order.
#[must_use]
pub fn categorical_stats(values: &[&Value]) -> CategoricalStats {
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut categories: Vec<CategoryCount> = Vec::new();

    for value in values {
        if value.is_missing() {
            continue;
        }
        let Some(text) = value.as_text() else {
            continue;
        };
        if let Some(&i) = index.get(&text) {
            categories[i].count += 1;
        } else {
            index.insert(text.clone(), categories.len());
            categories.push(CategoryCount {
                value: text,
                count: 1,
            });
        }
    }

    categories.sort_by(|a, b| b.count.cmp(&a.count));

    CategoricalStats { categories }
}

/// Summarizes each parent-location group (e.g. every state) separately.
///
/// Groups are the categories of `parent_attribute` in `global`; rows join a
/// group when their parent value's text form equals the category. Returns an
/// empty map when the parent attribute is missing or numeric.
#[must_use]
pub fn summarize_by_parent(
    rows: &[Row],
    global: &DataSummary,
    parent_attribute: &str,
) -> BTreeMap<String, DataSummary> {
    let Some(AttributeStats::Categorical(parents)) = global.get(parent_attribute) else {
        log::debug!("No categorical parent attribute '{parent_attribute}', skipping group summaries");
        return BTreeMap::new();
    };

    let mut groups: BTreeMap<&str, Vec<&Row>> = parents
        .categories
        .iter()
        .map(|c| (c.value.as_str(), Vec::new()))
        .collect();

    for row in rows {
        let Some(parent) = cell(row, parent_attribute).as_text() else {
            continue;
        };
        if let Some(group) = groups.get_mut(parent.as_str()) {
            group.push(row);
        }
    }

    groups
        .into_iter()
        .map(|(parent, group)| (parent.to_string(), summarize(&group)))
        .collect()
}
