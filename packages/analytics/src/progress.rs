//! Coarse-grained progress reporting for the compute pipeline.
//!
//! The engine itself never renders anything. Callers hand in a
//! [`ProgressCallback`] (an `indicatif` bar in the CLI, [`NullProgress`] in
//! tests) and receive one step per pipeline phase.

/// Receives progress updates from [`crate::pipeline::compute`].
pub trait ProgressCallback: Send + Sync {
    /// Sets the total number of steps.
    fn set_total(&self, total: u64);

    /// Advances by `delta` steps.
    fn inc(&self, delta: u64);

    /// Describes the step currently running.
    fn set_message(&self, msg: String);

    /// Marks the run as complete.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
