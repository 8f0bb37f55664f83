use crate::{Job, Phase, Progress, SavedArtifact};

/// Read-only projection handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub job: Option<Job>,
    /// Last submission error, job error or download error.
    pub error: Option<String>,
    pub submitting: bool,
    /// The job is taking unusually long; purely informational.
    pub still_working: bool,
    pub saved_artifacts: Vec<SavedArtifact>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn progress(&self) -> Option<Progress> {
        self.job.as_ref().and_then(Job::progress)
    }

    pub fn clip_count(&self) -> usize {
        self.job.as_ref().map_or(0, |job| job.units().len())
    }
}
