use std::fmt;
use std::path::PathBuf;

use clipper_logging::{clip_debug, clip_info, clip_warn};

use crate::view_model::AppViewModel;
use crate::{reduce, Effect, Job, JobId, JobStatus, Phase, PhaseEvent, StatusReport};

/// Shown when a failed job carries no detail of its own.
pub const PROCESSING_FAILED_MESSAGE: &str = "Processing failed";
/// Shown when polling is abandoned after repeated failures.
pub const LOST_CONTACT_MESSAGE: &str = "Lost contact with the clip service";

/// Identifies one submission attempt so late answers can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionTicket(pub u64);

impl fmt::Display for SubmissionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which artifact of a finished job to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactTarget {
    Unit(u32),
    Archive,
}

impl fmt::Display for ArtifactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactTarget::Unit(index) => write!(f, "clip {}", u64::from(*index) + 1),
            ArtifactTarget::Archive => write!(f, "clip archive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub target: ArtifactTarget,
    pub path: PathBuf,
}

/// Bounds on how long polling may misbehave before the user hears about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Consecutive failed polls after which polling is abandoned.
    pub max_consecutive_failures: u32,
    /// Applied polls without a terminal status before `still_working` is raised.
    pub still_working_after_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
            still_working_after_polls: 150,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrchestratorState {
    phase: Phase,
    job: Option<Job>,
    pending_submission: Option<SubmissionTicket>,
    next_ticket: u64,
    last_error: Option<String>,
    polls_applied: u32,
    consecutive_poll_failures: u32,
    still_working: bool,
    saved_artifacts: Vec<SavedArtifact>,
    policy: PollPolicy,
    dirty: bool,
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: PollPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            job: self.job.clone(),
            error: self.last_error.clone(),
            submitting: self.pending_submission.is_some(),
            still_working: self.still_working,
            saved_artifacts: self.saved_artifacts.clone(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn pending_submission(&self) -> Option<SubmissionTicket> {
        self.pending_submission
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Returns whether the view changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn active_job_id(&self) -> Option<&JobId> {
        self.job.as_ref().map(Job::id)
    }

    /// Moves the phase machine and emits the polling side effects of
    /// entering or leaving `processing`.
    fn transition(&mut self, event: PhaseEvent) -> Vec<Effect> {
        let previous = self.phase;
        let next = previous.next(event);
        if previous == next {
            return Vec::new();
        }
        clip_debug!("Phase {} -> {} on {:?}", previous, next, event);
        self.phase = next;
        self.mark_dirty();

        let Some(job_id) = self.active_job_id().cloned() else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        if previous == Phase::Processing {
            effects.push(Effect::StopPolling {
                job_id: job_id.clone(),
            });
        }
        if next == Phase::Processing {
            effects.push(Effect::StartPolling { job_id });
        }
        effects
    }

    pub(crate) fn begin_submission(&mut self) -> SubmissionTicket {
        self.next_ticket += 1;
        let ticket = SubmissionTicket(self.next_ticket);
        self.pending_submission = Some(ticket);
        self.last_error = None;
        self.mark_dirty();
        ticket
    }

    /// Clears the pending ticket if `ticket` is the one we are waiting for.
    fn settle_submission(&mut self, ticket: SubmissionTicket) -> bool {
        if self.pending_submission == Some(ticket) {
            self.pending_submission = None;
            true
        } else {
            clip_debug!("Discarding stale submission result {}", ticket);
            false
        }
    }

    pub(crate) fn apply_submitted(
        &mut self,
        ticket: SubmissionTicket,
        job_id: JobId,
    ) -> Vec<Effect> {
        if !self.settle_submission(ticket) {
            return Vec::new();
        }
        clip_info!("Job {} created", job_id);
        self.job = Some(Job::new(job_id));
        self.polls_applied = 0;
        self.consecutive_poll_failures = 0;
        self.still_working = false;
        self.saved_artifacts.clear();
        self.mark_dirty();
        self.transition(PhaseEvent::JobStarted)
    }

    pub(crate) fn apply_submission_failed(&mut self, ticket: SubmissionTicket, message: String) {
        if !self.settle_submission(ticket) {
            return;
        }
        clip_warn!("Submission {} failed: {}", ticket, message);
        self.last_error = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn apply_status(&mut self, job_id: &JobId, report: &StatusReport) -> Vec<Effect> {
        let Some(job) = self.live_job(job_id) else {
            return Vec::new();
        };

        let reduction = reduce(job, report);
        for warning in &reduction.warnings {
            clip_warn!("Job {}: {}", job_id, warning);
        }
        if !reduction.accepted {
            return Vec::new();
        }
        let changed = reduction.job != *job;

        self.polls_applied = self.polls_applied.saturating_add(1);
        self.consecutive_poll_failures = 0;
        if changed {
            self.mark_dirty();
        }
        let status = reduction.job.status();
        if status == JobStatus::Error {
            let message = reduction
                .job
                .error_detail()
                .unwrap_or(PROCESSING_FAILED_MESSAGE)
                .to_string();
            clip_warn!("Job {} failed: {}", job_id, message);
            self.last_error = Some(message);
        }
        self.job = Some(reduction.job);

        if !status.is_terminal()
            && !self.still_working
            && self.polls_applied >= self.policy.still_working_after_polls
        {
            clip_info!("Job {} still running after {} polls", job_id, self.polls_applied);
            self.still_working = true;
            self.mark_dirty();
        }

        self.transition(PhaseEvent::StatusObserved(status))
    }

    pub(crate) fn apply_poll_failure(&mut self, job_id: &JobId, message: &str) -> Vec<Effect> {
        if self.live_job(job_id).is_none() {
            return Vec::new();
        }
        self.consecutive_poll_failures = self.consecutive_poll_failures.saturating_add(1);
        clip_debug!(
            "Poll for job {} failed ({} in a row): {}",
            job_id,
            self.consecutive_poll_failures,
            message
        );
        if self.consecutive_poll_failures < self.policy.max_consecutive_failures {
            return Vec::new();
        }
        clip_warn!(
            "Giving up on job {} after {} failed polls",
            job_id,
            self.consecutive_poll_failures
        );
        self.last_error = Some(LOST_CONTACT_MESSAGE.to_string());
        self.mark_dirty();
        self.transition(PhaseEvent::PollingAbandoned)
    }

    /// The active job, if `job_id` names it and it is still being polled.
    fn live_job(&self, job_id: &JobId) -> Option<&Job> {
        let live = self
            .job
            .as_ref()
            .filter(|job| job.id() == job_id && self.phase == Phase::Processing);
        if live.is_none() {
            clip_debug!("Discarding stale poll result for job {}", job_id);
        }
        live
    }

    /// Stops polling, drops the job and any pending submission, returns to `input`.
    pub(crate) fn reset(&mut self) -> Vec<Effect> {
        let had_state = self.job.is_some()
            || self.pending_submission.is_some()
            || self.last_error.is_some()
            || self.phase != Phase::Input;
        if !had_state {
            return Vec::new();
        }

        let effects = self.transition(PhaseEvent::Reset);
        if let Some(job_id) = self.active_job_id() {
            clip_info!("Discarding job {}", job_id);
        }
        self.job = None;
        self.pending_submission = None;
        self.last_error = None;
        self.polls_applied = 0;
        self.consecutive_poll_failures = 0;
        self.still_working = false;
        self.saved_artifacts.clear();
        self.mark_dirty();
        effects
    }

    pub(crate) fn request_artifact(&mut self, target: ArtifactTarget) -> Option<Effect> {
        if self.phase != Phase::Results {
            clip_debug!("Ignoring {} request outside results", target);
            return None;
        }
        let job = self.job.as_ref()?;
        let reference = match target {
            ArtifactTarget::Unit(index) => job.unit(index).map(|unit| unit.retrieval_ref.clone()),
            ArtifactTarget::Archive => job.archive_ref().cloned(),
        };
        let Some(reference) = reference else {
            clip_warn!("Job {} has no {}", job.id(), target);
            self.last_error = Some(format!("No {target} is available for this job"));
            self.mark_dirty();
            return None;
        };
        Some(Effect::DownloadArtifact {
            job_id: job.id().clone(),
            target,
            reference,
            source_title: job.source_title().map(ToOwned::to_owned),
        })
    }

    pub(crate) fn record_artifact_saved(
        &mut self,
        job_id: &JobId,
        target: ArtifactTarget,
        path: PathBuf,
    ) {
        if self.active_job_id() != Some(job_id) {
            clip_debug!("Discarding saved {} for inactive job {}", target, job_id);
            return;
        }
        clip_info!("Saved {} of job {} to {:?}", target, job_id, path);
        self.saved_artifacts.retain(|saved| saved.target != target);
        self.saved_artifacts.push(SavedArtifact { target, path });
        self.mark_dirty();
    }

    pub(crate) fn record_artifact_failed(
        &mut self,
        job_id: &JobId,
        target: ArtifactTarget,
        message: &str,
    ) {
        if self.active_job_id() != Some(job_id) {
            return;
        }
        clip_warn!("Saving {} of job {} failed: {}", target, job_id, message);
        self.last_error = Some(format!("Could not save {target}: {message}"));
        self.mark_dirty();
    }
}
