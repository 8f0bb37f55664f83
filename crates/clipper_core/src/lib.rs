//! Clipper core: pure job lifecycle state machine and view-model helpers.
mod effect;
mod job;
mod msg;
mod phase;
mod reduce;
mod request;
mod state;
mod timestamp;
mod update;
mod view_model;

pub use effect::Effect;
pub use job::{ArtifactRef, ClipUnit, Job, JobId, JobStatus, Progress, ReportedStatus, StatusReport};
pub use msg::Msg;
pub use phase::{Phase, PhaseEvent};
pub use reduce::{reduce, ReduceWarning, Reduction};
pub use request::{is_supported_source_url, ClipRequest, ClipWindow};
pub use state::{
    ArtifactTarget, OrchestratorState, PollPolicy, SavedArtifact, SubmissionTicket,
    LOST_CONTACT_MESSAGE, PROCESSING_FAILED_MESSAGE,
};
pub use timestamp::{format_timestamp, parse_timestamp, TimestampError};
pub use update::update;
pub use view_model::AppViewModel;
