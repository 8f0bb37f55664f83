use std::sync::mpsc;
use std::time::Duration;

use clipper_core::{JobId, JobStatus};
use clipper_logging::{clip_debug, clip_info, clip_warn};
use tokio_util::sync::CancellationToken;

use crate::{ClipService, EngineEvent, PollError};

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Pause between the end of one poll and the start of the next.
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
        }
    }
}

/// Why a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    Terminal(JobStatus),
    Cancelled,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Polls `job_id` until the service reports a terminal status or `cancel` fires.
///
/// Requests are strictly sequential: the next one is scheduled only after the
/// previous response was delivered. A failed attempt is reported as
/// [`EngineEvent::PollFailed`] and retried on the next tick; so is a report
/// naming a different job. Once `cancel` fires nothing more is delivered,
/// including a response already in flight.
pub async fn poll_until_terminal(
    service: &dyn ClipService,
    job_id: &JobId,
    settings: &PollSettings,
    cancel: &CancellationToken,
    sink: &dyn EventSink,
) -> PollExit {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                clip_debug!("Poll for job {} cancelled during attempt {}", job_id, attempt);
                return PollExit::Cancelled;
            }
            result = service.status(job_id) => result,
        };
        if cancel.is_cancelled() {
            clip_debug!("Dropping response for cancelled job {}", job_id);
            return PollExit::Cancelled;
        }

        // A report about some other job says nothing about ours.
        let result = result.and_then(|report| match &report.job_id {
            Some(reported) if reported != job_id => Err(PollError::Malformed(format!(
                "report names job {reported}"
            ))),
            _ => Ok(report),
        });

        match result {
            Ok(report) => {
                let terminal = report.terminal_status();
                sink.emit(EngineEvent::Status {
                    job_id: job_id.clone(),
                    report,
                });
                if let Some(status) = terminal {
                    clip_info!("Job {} reached {} after {} polls", job_id, status, attempt);
                    return PollExit::Terminal(status);
                }
            }
            Err(error) => {
                clip_warn!("Poll attempt {} for job {} failed: {}", attempt, job_id, error);
                sink.emit(EngineEvent::PollFailed {
                    job_id: job_id.clone(),
                    error,
                });
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollExit::Cancelled,
            _ = tokio::time::sleep(settings.interval) => {}
        }
    }
}
