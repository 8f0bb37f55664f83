use std::fmt;
use std::time::Duration;

/// Opaque job identifier assigned by the processing service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Opaque handle for downloading a finished artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    #[default]
    Queued,
    Downloading,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Downloading => "downloading",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// Parses the service's status string. Unknown strings yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" => Some(JobStatus::Queued),
            "downloading" => Some(JobStatus::Downloading),
            "processing" | "running" => Some(JobStatus::Processing),
            "done" | "completed" => Some(JobStatus::Done),
            "error" | "failed" => Some(JobStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    /// Whether a snapshot in `self` may move to `next`.
    ///
    /// Staying put is allowed so that re-delivered reports stay idempotent.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            JobStatus::Error => true,
            _ => self.rank() <= next.rank(),
        }
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Downloading => 1,
            JobStatus::Processing => 2,
            JobStatus::Done => 3,
            JobStatus::Error => 4,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status as reported on the wire; the service may send values we do not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedStatus {
    Known(JobStatus),
    Unrecognized(String),
}

impl ReportedStatus {
    pub fn parse(raw: &str) -> Self {
        match JobStatus::parse(raw) {
            Some(status) => ReportedStatus::Known(status),
            None => ReportedStatus::Unrecognized(raw.to_string()),
        }
    }

    pub fn known(&self) -> Option<JobStatus> {
        match self {
            ReportedStatus::Known(status) => Some(*status),
            ReportedStatus::Unrecognized(_) => None,
        }
    }
}

impl From<JobStatus> for ReportedStatus {
    fn from(status: JobStatus) -> Self {
        ReportedStatus::Known(status)
    }
}

/// Clip-level progress. A `total` of zero means the count is not known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

impl Progress {
    pub fn new(completed: u32, total: u32) -> Self {
        Self { completed, total }
    }

    pub fn is_known(&self) -> bool {
        self.total > 0
    }

    pub fn fraction(&self) -> Option<f32> {
        self.is_known()
            .then(|| self.completed.min(self.total) as f32 / self.total as f32)
    }
}

/// One extracted clip belonging to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipUnit {
    pub index: u32,
    pub start_offset: Duration,
    pub duration: Duration,
    pub retrieval_ref: ArtifactRef,
}

/// Canonical snapshot of the active job. Only the reducer mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub(crate) id: JobId,
    pub(crate) status: JobStatus,
    pub(crate) progress: Option<Progress>,
    pub(crate) units: Vec<ClipUnit>,
    pub(crate) source_title: Option<String>,
    pub(crate) error_detail: Option<String>,
    pub(crate) archive_ref: Option<ArtifactRef>,
}

impl Job {
    /// A freshly submitted job, waiting in the service queue.
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            progress: None,
            units: Vec::new(),
            source_title: None,
            error_detail: None,
            archive_ref: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Progress is only meaningful while the service is processing clips.
    pub fn progress(&self) -> Option<Progress> {
        if self.status == JobStatus::Processing {
            self.progress
        } else {
            None
        }
    }

    /// Units ordered by index.
    pub fn units(&self) -> &[ClipUnit] {
        &self.units
    }

    pub fn unit(&self, index: u32) -> Option<&ClipUnit> {
        self.units
            .binary_search_by_key(&index, |unit| unit.index)
            .ok()
            .map(|pos| &self.units[pos])
    }

    pub fn source_title(&self) -> Option<&str> {
        self.source_title.as_deref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn archive_ref(&self) -> Option<&ArtifactRef> {
        self.archive_ref.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One status response from the service. Absent fields mean "no news".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusReport {
    pub job_id: Option<JobId>,
    pub status: Option<ReportedStatus>,
    pub progress: Option<Progress>,
    pub units: Option<Vec<ClipUnit>>,
    pub source_title: Option<String>,
    pub error_detail: Option<String>,
    pub archive_ref: Option<ArtifactRef>,
}

impl StatusReport {
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status: Some(ReportedStatus::Known(status)),
            ..Self::default()
        }
    }

    /// The reported status if it ends the job.
    pub fn terminal_status(&self) -> Option<JobStatus> {
        match self.status {
            Some(ReportedStatus::Known(status)) if status.is_terminal() => Some(status),
            _ => None,
        }
    }
}
