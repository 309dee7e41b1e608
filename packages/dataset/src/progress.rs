//! Progress reporting for fusion runs.
//!
//! The pipeline reports one unit of work per stage through
//! [`ProgressCallback`]. Rendering is left to the caller: the CLI plugs in
//! `indicatif` bars, tests and library users get [`NullProgress`].

use std::sync::Arc;

/// Receiver for stage-level progress of a fusion run.
pub trait ProgressCallback: Send + Sync {
    /// Set the number of stages the run will go through.
    fn set_total(&self, total: u64);

    /// Mark `delta` more stages as completed.
    fn inc(&self, delta: u64);

    /// Describe the stage currently running.
    fn set_message(&self, msg: String);

    /// The run completed; show a final message.
    fn finish(&self, msg: String);

    /// The run completed; remove the indicator.
    fn finish_and_clear(&self);
}

/// Discards every progress update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
