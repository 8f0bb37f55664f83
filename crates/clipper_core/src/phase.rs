use std::fmt;

use crate::JobStatus;

/// Coarse UI phase derived from the active job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Input,
    Processing,
    Results,
}

/// Inputs that can move the phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// The service accepted a submission and a job now exists.
    JobStarted,
    /// A status report was applied to the active job.
    StatusObserved(JobStatus),
    /// Polling gave up after too many consecutive failures.
    PollingAbandoned,
    /// User reset, or the consuming view went away.
    Reset,
}

impl Phase {
    pub fn next(self, event: PhaseEvent) -> Phase {
        match (self, event) {
            (_, PhaseEvent::Reset) => Phase::Input,
            (Phase::Input, PhaseEvent::JobStarted) => Phase::Processing,
            (Phase::Processing, PhaseEvent::StatusObserved(status)) => match status {
                JobStatus::Done => Phase::Results,
                JobStatus::Error => Phase::Input,
                JobStatus::Queued | JobStatus::Downloading | JobStatus::Processing => {
                    Phase::Processing
                }
            },
            (Phase::Processing, PhaseEvent::PollingAbandoned) => Phase::Input,
            (phase, _) => phase,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Input => "input",
            Phase::Processing => "processing",
            Phase::Results => "results",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
