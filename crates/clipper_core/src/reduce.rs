use std::fmt;

use crate::{ClipUnit, Job, JobId, JobStatus, ReportedStatus, StatusReport};

/// Why a report was (partly) ignored while merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReduceWarning {
    /// The report names a different job; nothing was applied.
    ForeignJob { expected: JobId, received: JobId },
    /// The job already reached a terminal status; nothing was applied.
    AfterTerminal { status: JobStatus },
    /// The report would move the status backward; nothing was applied.
    BackwardTransition { from: JobStatus, to: JobStatus },
    /// The status string was not understood; the rest of the report was applied.
    UnrecognizedStatus(String),
}

impl fmt::Display for ReduceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReduceWarning::ForeignJob { expected, received } => {
                write!(f, "report for job {received} while tracking {expected}")
            }
            ReduceWarning::AfterTerminal { status } => {
                write!(f, "report after terminal status {status}")
            }
            ReduceWarning::BackwardTransition { from, to } => {
                write!(f, "backward status transition {from} -> {to}")
            }
            ReduceWarning::UnrecognizedStatus(raw) => write!(f, "unrecognized status {raw:?}"),
        }
    }
}

/// Result of merging one report into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub job: Job,
    /// False when the whole report was rejected and `job` equals the input.
    pub accepted: bool,
    pub warnings: Vec<ReduceWarning>,
}

impl Reduction {
    fn rejected(previous: &Job, warning: ReduceWarning) -> Self {
        Self {
            job: previous.clone(),
            accepted: false,
            warnings: vec![warning],
        }
    }
}

/// Pure merge of a status report into the previous snapshot.
///
/// Present fields overwrite, absent fields are kept. Units are merged by
/// index and never removed. A report that would move the status backward is
/// rejected as a whole; `error` is accepted from any non-terminal status.
pub fn reduce(previous: &Job, report: &StatusReport) -> Reduction {
    if let Some(received) = &report.job_id {
        if received != previous.id() {
            return Reduction::rejected(
                previous,
                ReduceWarning::ForeignJob {
                    expected: previous.id().clone(),
                    received: received.clone(),
                },
            );
        }
    }

    if previous.is_terminal() {
        return Reduction::rejected(
            previous,
            ReduceWarning::AfterTerminal {
                status: previous.status(),
            },
        );
    }

    let mut warnings = Vec::new();
    let mut next = previous.clone();

    match &report.status {
        Some(ReportedStatus::Known(status)) => {
            if !previous.status().can_transition_to(*status) {
                return Reduction::rejected(
                    previous,
                    ReduceWarning::BackwardTransition {
                        from: previous.status(),
                        to: *status,
                    },
                );
            }
            next.status = *status;
        }
        Some(ReportedStatus::Unrecognized(raw)) => {
            warnings.push(ReduceWarning::UnrecognizedStatus(raw.clone()));
        }
        None => {}
    }

    if let Some(progress) = report.progress {
        next.progress = Some(progress);
    }
    if let Some(units) = &report.units {
        merge_units(&mut next.units, units);
    }
    if let Some(title) = &report.source_title {
        next.source_title = Some(title.clone());
    }
    if let Some(archive) = &report.archive_ref {
        next.archive_ref = Some(archive.clone());
    }
    // Detail only belongs to failed jobs.
    if next.status == JobStatus::Error {
        if let Some(detail) = &report.error_detail {
            next.error_detail = Some(detail.clone());
        }
    }

    Reduction {
        job: next,
        accepted: true,
        warnings,
    }
}

fn merge_units(known: &mut Vec<ClipUnit>, incoming: &[ClipUnit]) {
    for unit in incoming {
        match known.binary_search_by_key(&unit.index, |existing| existing.index) {
            Ok(pos) => {
                if known[pos].retrieval_ref != unit.retrieval_ref {
                    known[pos].retrieval_ref = unit.retrieval_ref.clone();
                }
            }
            Err(pos) => known.insert(pos, unit.clone()),
        }
    }
}
