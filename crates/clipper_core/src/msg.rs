use std::path::PathBuf;

use crate::{ArtifactTarget, ClipRequest, JobId, StatusReport, SubmissionTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted a (validated) clip request.
    SubmitRequested(ClipRequest),
    /// Service accepted the submission identified by `ticket`.
    Submitted {
        ticket: SubmissionTicket,
        job_id: JobId,
    },
    /// Service rejected the submission, or it never got there.
    SubmissionFailed {
        ticket: SubmissionTicket,
        message: String,
    },
    /// One successful poll response.
    StatusReceived { job_id: JobId, report: StatusReport },
    /// One poll attempt that produced no usable response.
    PollFailed { job_id: JobId, message: String },
    /// User clicked Reset / Start over.
    ResetRequested,
    /// The consuming view is being dismantled.
    Teardown,
    /// User asked to save a finished clip or the bundled archive.
    ArtifactRequested(ArtifactTarget),
    ArtifactSaved {
        job_id: JobId,
        target: ArtifactTarget,
        path: PathBuf,
    },
    ArtifactFailed {
        job_id: JobId,
        target: ArtifactTarget,
        message: String,
    },
}
