use crate::{ArtifactRef, ArtifactTarget, ClipRequest, JobId, SubmissionTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Submit {
        ticket: SubmissionTicket,
        request: ClipRequest,
    },
    StartPolling {
        job_id: JobId,
    },
    StopPolling {
        job_id: JobId,
    },
    DownloadArtifact {
        job_id: JobId,
        target: ArtifactTarget,
        reference: ArtifactRef,
        source_title: Option<String>,
    },
}
