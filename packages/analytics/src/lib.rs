#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pattern analytics engine.
//!
//! Takes an in-memory tabular dataset and a list of mined patterns
//! (attribute constraints associated with a target attribute) and works out,
//! per pattern and per location, which rows match and how the target value
//! rolls up:
//!
//! * [`summary`] infers attribute types and computes descriptive statistics
//! * [`pattern`] parses raw pattern records into constraint sets
//! * [`evaluate`] decides which rows satisfy a constraint set
//! * [`merge`] unions constraints recorded against the same location
//! * [`analyze`] evaluates every pattern and folds matches into per-location
//!   summaries
//! * [`pipeline`] runs all of the above for one upload
//!
//! Everything here is synchronous and deterministic; callers wanting to keep
//! an interactive surface responsive should run it off the main thread.

pub mod analyze;
pub mod evaluate;
pub mod merge;
pub mod pattern;
pub mod pipeline;
pub mod progress;
pub mod summary;

use thiserror::Error;

pub use analyze::analyze;
pub use evaluate::{filter, matches};
pub use merge::merge;
pub use pattern::{ParseError, PatternError, parse_pattern, parse_patterns};
pub use pipeline::compute;
pub use summary::summarize;

/// Errors that can occur while computing analytics.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A pattern record could not be parsed and the run is set to fail fast.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// The dataset lacks a column the analysis needs.
    #[error("Dataset has no '{column}' column")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },
}
