//! Pattern analysis and per-location aggregation.
//!
//! Each pattern is evaluated against the full dataset independently. Its
//! effect on locations is expressed as a list of [`LocationUpdate`]s which
//! are folded into the [`LocationSummary`] map with [`apply_update`]. The
//! fold only adds numbers, unions pattern ids and merges constraints, so the
//! updates of different patterns can be computed in any order (or in
//! parallel) and reduced afterwards.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use pattern_map_analytics_models::{
    AnalysisConfig, AnalysisResult, ConstraintSet, DataSummary, LocationConstraint, LocationId,
    LocationSummary, Pattern, PatternDefinition, PatternId, Row, cell,
};

use crate::evaluate::filter;
use crate::merge::merge;
use crate::summary::summarize;

/// The contribution of one pattern to one location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate<'a> {
    /// Location being updated.
    pub location: LocationId,
    /// Pattern that matched rows in the location.
    pub pattern_id: PatternId,
    /// Sum of the target values of the matched rows.
    pub target_sum: f64,
    /// Number of matched rows with a numeric target value.
    pub contributions: u64,
    /// Number of matched rows.
    pub matched_rows: u64,
    /// Constraints of the pattern.
    pub constraints: &'a ConstraintSet,
}

/// Folds one update into a location summary.
///
/// Target values add up, the pattern id joins the list once, and every
/// constraint is merged into the recorded one for its attribute (or
/// recorded fresh), with its count raised by the matched rows.
pub fn apply_update(summary: &mut LocationSummary, update: &LocationUpdate<'_>) {
    if !summary.patterns.contains(&update.pattern_id) {
        summary.patterns.push(update.pattern_id);
    }
    summary.target_value += update.target_sum;
    summary.contributions += update.contributions;

    for (attribute, constraint) in update.constraints {
        match summary.constraints.entry(attribute.clone()) {
            Entry::Occupied(mut entry) => {
                let recorded = entry.get_mut();
                recorded.count += update.matched_rows;
                recorded.constraint = merge(&recorded.constraint, constraint);
            }
            Entry::Vacant(entry) => {
                entry.insert(LocationConstraint {
                    count: update.matched_rows,
                    constraint: constraint.clone(),
                });
            }
        }
    }
}

/// Reads a row's location id. Only whole numbers are valid ids.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn location_id(row: &Row, location_attribute: &str) -> Option<LocationId> {
    cell(row, location_attribute)
        .as_number()
        .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15)
        .map(|v| v as LocationId)
}

/// Creates an untouched summary for every location id in the dataset.
///
/// When several rows share an id, the last one names the location.
#[must_use]
pub fn init_locations(
    rows: &[Row],
    config: &AnalysisConfig,
) -> BTreeMap<LocationId, LocationSummary> {
    let mut locations = BTreeMap::new();
    let mut invalid = 0_usize;

    for row in rows {
        let Some(id) = location_id(row, &config.location_attribute) else {
            invalid += 1;
            continue;
        };
        let name = cell(row, &config.name_attribute)
            .as_text()
            .unwrap_or_default();
        let parent = cell(row, &config.parent_attribute)
            .as_text()
            .unwrap_or_default();
        locations.insert(id, LocationSummary::new(name, parent));
    }

    if invalid > 0 {
        log::warn!(
            "{invalid} row(s) have no numeric '{}' and are excluded from location rollups",
            config.location_attribute
        );
    }

    locations
}

/// Groups a pattern's matching rows by location, in first-seen order.
#[must_use]
pub fn location_updates<'a>(
    pattern: &'a PatternDefinition,
    subset: &[&Row],
    location_attribute: &str,
) -> Vec<LocationUpdate<'a>> {
    let mut updates: Vec<LocationUpdate<'a>> = Vec::new();
    let mut index: BTreeMap<LocationId, usize> = BTreeMap::new();

    for row in subset {
        let Some(location) = location_id(row, location_attribute) else {
            continue;
        };
        let i = *index.entry(location).or_insert_with(|| {
            updates.push(LocationUpdate {
                location,
                pattern_id: pattern.id,
                target_sum: 0.0,
                contributions: 0,
                matched_rows: 0,
                constraints: &pattern.constraints,
            });
            updates.len() - 1
        });

        let update = &mut updates[i];
        update.matched_rows += 1;
        if let Some(value) = cell(row, &pattern.target).as_number() {
            update.target_sum += value;
            update.contributions += 1;
        }
    }

    updates
}

/// Evaluates every pattern against the dataset and rolls the matches up per
/// location.
///
/// Patterns are processed in input order. A pattern matching nothing is
/// returned with `row_count = 0`, an empty summary and no locations, and
/// leaves every location untouched. The returned `target` is that of the
/// last pattern with at least one match. Output depends only on the inputs.
#[must_use]
pub fn analyze(
    rows: &[Row],
    patterns: &[PatternDefinition],
    config: &AnalysisConfig,
) -> AnalysisResult {
    let mut locations = init_locations(rows, config);
    let mut enriched = Vec::with_capacity(patterns.len());
    let mut target = String::new();

    for pattern in patterns {
        let subset = filter(rows, &pattern.constraints);

        if subset.is_empty() {
            log::debug!("Pattern {} matched no rows", pattern.id);
            enriched.push(Pattern::from_definition(
                pattern.clone(),
                0,
                DataSummary::new(),
                Vec::new(),
            ));
            continue;
        }

        let updates = location_updates(pattern, &subset, &config.location_attribute);
        for update in &updates {
            if let Some(summary) = locations.get_mut(&update.location) {
                apply_update(summary, update);
            }
        }

        log::debug!(
            "Pattern {} matched {} row(s) across {} location(s)",
            pattern.id,
            subset.len(),
            updates.len()
        );

        target.clone_from(&pattern.target);
        let summary = summarize(&subset);
        let pattern_locations = updates.iter().map(|u| u.location).collect();

        enriched.push(Pattern::from_definition(
            pattern.clone(),
            subset.len() as u64,
            summary,
            pattern_locations,
        ));
    }

    AnalysisResult {
        patterns: enriched,
        locations,
        target,
    }
}
