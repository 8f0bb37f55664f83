use std::path::PathBuf;

use clipper_core::{ArtifactTarget, JobId, Msg, StatusReport, SubmissionTicket};
use thiserror::Error;

use crate::poller::PollExit;

/// Shown when the service gave us nothing better to say.
pub const GENERIC_SUBMISSION_MESSAGE: &str = "Error generating clip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        ticket: SubmissionTicket,
        job_id: JobId,
    },
    SubmissionFailed {
        ticket: SubmissionTicket,
        error: SubmissionError,
    },
    Status {
        job_id: JobId,
        report: StatusReport,
    },
    PollFailed {
        job_id: JobId,
        error: PollError,
    },
    PollFinished {
        job_id: JobId,
        exit: PollExit,
    },
    ArtifactSaved {
        job_id: JobId,
        target: ArtifactTarget,
        path: PathBuf,
    },
    ArtifactFailed {
        job_id: JobId,
        target: ArtifactTarget,
        error: ArtifactError,
    },
}

impl EngineEvent {
    /// The core message this event feeds, if any.
    pub fn into_msg(self) -> Option<Msg> {
        let msg = match self {
            EngineEvent::Submitted { ticket, job_id } => Msg::Submitted { ticket, job_id },
            EngineEvent::SubmissionFailed { ticket, error } => Msg::SubmissionFailed {
                ticket,
                message: error.user_message(),
            },
            EngineEvent::Status { job_id, report } => Msg::StatusReceived { job_id, report },
            EngineEvent::PollFailed { job_id, error } => Msg::PollFailed {
                job_id,
                message: error.to_string(),
            },
            EngineEvent::PollFinished { .. } => return None,
            EngineEvent::ArtifactSaved {
                job_id,
                target,
                path,
            } => Msg::ArtifactSaved {
                job_id,
                target,
                path,
            },
            EngineEvent::ArtifactFailed {
                job_id,
                target,
                error,
            } => Msg::ArtifactFailed {
                job_id,
                target,
                message: error.to_string(),
            },
        };
        Some(msg)
    }
}

/// The service refused the submission or could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("service rejected submission with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed submission response: {0}")]
    Malformed(String),
}

impl SubmissionError {
    /// Text for the user: the service's own `detail` when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Rejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => GENERIC_SUBMISSION_MESSAGE.to_string(),
        }
    }
}

/// One poll attempt that produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("malformed status response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("invalid artifact reference {0:?}")]
    InvalidReference(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("artifact too large (max {max_bytes}, actual {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("could not write artifact: {0}")]
    Persist(String),
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid service base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("http client: {0}")]
    Client(String),
    #[error("tokio runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
