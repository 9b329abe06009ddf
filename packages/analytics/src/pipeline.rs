//! End-to-end computation for one dataset/pattern upload.
//!
//! Runs the phases in order (parse patterns, summarize the dataset,
//! summarize parent groups, analyze patterns) and reports one progress step
//! per phase.

use chrono::{SecondsFormat, Utc};
use pattern_map_analytics_models::{AnalysisConfig, ComputeResult, PatternErrorReport, Row};

use crate::AnalyticsError;
use crate::analyze::analyze;
use crate::pattern::parse_patterns;
use crate::progress::ProgressCallback;
use crate::summary::{summarize, summarize_by_parent};

/// Number of progress steps reported by [`compute`].
pub const COMPUTE_STEPS: u64 = 4;

/// Computes everything the presentation layer needs.
///
/// Malformed pattern records are logged and listed in
/// [`ComputeResult::pattern_errors`]; the remaining patterns are analyzed as
/// usual. With [`AnalysisConfig::fail_fast`] the first malformed record
/// aborts the run instead.
///
/// # Errors
///
/// * [`AnalyticsError::MissingColumn`] if no dataset row carries the
///   location attribute
/// * [`AnalyticsError::Pattern`] if `fail_fast` is set and a pattern record
///   cannot be parsed
pub fn compute(
    dataset: &[Row],
    pattern_records: &[Row],
    config: &AnalysisConfig,
    progress: &dyn ProgressCallback,
) -> Result<ComputeResult, AnalyticsError> {
    if !dataset.is_empty()
        && !dataset
            .iter()
            .any(|row| row.contains_key(&config.location_attribute))
    {
        return Err(AnalyticsError::MissingColumn {
            column: config.location_attribute.clone(),
        });
    }

    progress.set_total(COMPUTE_STEPS);

    progress.set_message("Parsing patterns".to_string());
    let mut definitions = Vec::with_capacity(pattern_records.len());
    let mut pattern_errors = Vec::new();
    for result in parse_patterns(pattern_records) {
        match result {
            Ok(definition) => definitions.push(definition),
            Err(e) if config.fail_fast => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping {e}");
                pattern_errors.push(PatternErrorReport {
                    row: e.row,
                    message: e.error.to_string(),
                });
            }
        }
    }
    log::info!(
        "Parsed {} pattern(s), skipped {}",
        definitions.len(),
        pattern_errors.len()
    );
    progress.inc(1);

    progress.set_message("Summarizing dataset".to_string());
    let data_summary = summarize(dataset);
    log::info!(
        "Summarized {} attribute(s) over {} row(s)",
        data_summary.len(),
        dataset.len()
    );
    progress.inc(1);

    progress.set_message("Summarizing parent locations".to_string());
    let parent_location_summary =
        summarize_by_parent(dataset, &data_summary, &config.parent_attribute);
    log::info!(
        "Summarized {} parent location group(s)",
        parent_location_summary.len()
    );
    progress.inc(1);

    progress.set_message("Analyzing patterns".to_string());
    let analysis = analyze(dataset, &definitions, config);
    progress.inc(1);

    progress.finish(format!(
        "Analyzed {} pattern(s) across {} location(s)",
        analysis.patterns.len(),
        analysis.locations.len()
    ));

    Ok(ComputeResult {
        data_summary,
        parent_location_summary,
        patterns: analysis.patterns,
        locations: analysis.locations,
        target: analysis.target,
        pattern_errors,
        computed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pattern_map_analytics_models::Value;

    use super::*;
    use crate::progress::NullProgress;

    #[derive(Default)]
    struct RecordingProgress {
        steps: Mutex<u64>,
        messages: Mutex<Vec<String>>,
    }

    impl ProgressCallback for RecordingProgress {
        fn set_total(&self, _total: u64) {}

        fn inc(&self, delta: u64) {
            *self.steps.lock().unwrap() += delta;
        }

        fn set_message(&self, msg: String) {
            self.messages.lock().unwrap().push(msg);
        }

        fn finish(&self, _msg: String) {}
    }

    fn dataset() -> Vec<Row> {
        [(1.0, "A", "S1", 10.0), (2.0, "B", "S1", 60.0), (3.0, "C", "S2", 90.0)]
            .into_iter()
            .map(|(fips, county, state, income)| {
                let mut row = Row::new();
                row.insert("fips".to_string(), Value::Number(fips));
                row.insert("county".to_string(), Value::from(county));
                row.insert("state".to_string(), Value::from(state));
                row.insert("income".to_string(), Value::Number(income));
                row
            })
            .collect()
    }

    fn pattern_record(description: &str) -> Row {
        let mut row = Row::new();
        row.insert("description".to_string(), Value::from(description));
        row.insert("target".to_string(), Value::from("income"));
        row.insert("mean".to_string(), Value::Number(10.0));
        row
    }

    #[test]
    fn computes_all_sections() {
        let patterns = vec![
            pattern_record("{'ID': 1, 'constraints': {'income': {'lb': -inf, 'ub': 50}}}"),
            pattern_record("{'ID': 2, 'constraints': {'state': {'in': ['S2']}}}"),
        ];
        let progress = RecordingProgress::default();

        let result = compute(&dataset(), &patterns, &AnalysisConfig::default(), &progress).unwrap();

        assert_eq!(result.data_summary.len(), 4);
        assert_eq!(
            result
                .parent_location_summary
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>(),
            vec!["S1", "S2"]
        );
        assert_eq!(result.patterns.len(), 2);
        assert_eq!(result.patterns[0].locations, vec![1]);
        assert_eq!(result.patterns[1].locations, vec![3]);
        assert!((result.locations[&1].target_value - 10.0).abs() < f64::EPSILON);
        assert!((result.locations[&3].target_value - 90.0).abs() < f64::EPSILON);
        assert!(result.locations[&2].patterns.is_empty());
        assert_eq!(result.target, "income");
        assert!(result.pattern_errors.is_empty());
        assert!(result.computed_at.ends_with('Z'));

        assert_eq!(*progress.steps.lock().unwrap(), COMPUTE_STEPS);
        assert_eq!(progress.messages.lock().unwrap().len(), 4);
    }

    #[test]
    fn malformed_patterns_are_reported_and_skipped() {
        let patterns = vec![
            pattern_record("{'ID': 1, 'constraints': {}}"),
            pattern_record("{broken"),
        ];

        let result =
            compute(&dataset(), &patterns, &AnalysisConfig::default(), &NullProgress).unwrap();

        assert_eq!(result.patterns.len(), 1);
        assert_eq!(result.pattern_errors.len(), 1);
        assert_eq!(result.pattern_errors[0].row, 1);
        assert!(
            result.pattern_errors[0]
                .message
                .starts_with("Invalid pattern description")
        );
    }

    #[test]
    fn fail_fast_aborts_on_first_malformed_pattern() {
        let patterns = vec![pattern_record("{broken"), pattern_record("{'ID': 2, 'constraints': {}}")];
        let config = AnalysisConfig {
            fail_fast: true,
            ..AnalysisConfig::default()
        };

        let err = compute(&dataset(), &patterns, &config, &NullProgress).unwrap_err();
        assert!(matches!(err, AnalyticsError::Pattern(ref e) if e.row == 0));
    }

    #[test]
    fn missing_location_column_is_an_error() {
        let config = AnalysisConfig {
            location_attribute: "geoid".to_string(),
            ..AnalysisConfig::default()
        };

        let err = compute(&dataset(), &[], &config, &NullProgress).unwrap_err();
        assert!(matches!(err, AnalyticsError::MissingColumn { ref column } if column == "geoid"));
    }

    #[test]
    fn empty_inputs_produce_empty_result() {
        let result = compute(&[], &[], &AnalysisConfig::default(), &NullProgress).unwrap();
        assert!(result.data_summary.is_empty());
        assert!(result.locations.is_empty());
        assert!(result.patterns.is_empty());
        assert_eq!(result.target, "");
    }
}
