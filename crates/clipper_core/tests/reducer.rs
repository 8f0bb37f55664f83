use std::time::Duration;

use clipper_core::{
    reduce, ArtifactRef, ClipUnit, Job, JobId, JobStatus, Progress, ReduceWarning,
    ReportedStatus, StatusReport,
};
use pretty_assertions::assert_eq;

const ALL_STATUSES: [JobStatus; 5] = [
    JobStatus::Queued,
    JobStatus::Downloading,
    JobStatus::Processing,
    JobStatus::Done,
    JobStatus::Error,
];

fn unit(index: u32, reference: &str) -> ClipUnit {
    ClipUnit {
        index,
        start_offset: Duration::from_secs(u64::from(index) * 30),
        duration: Duration::from_secs(30),
        retrieval_ref: ArtifactRef::new(reference),
    }
}

fn job_in(status: JobStatus) -> Job {
    let job = Job::new(JobId::new("j1"));
    if status == JobStatus::Queued {
        return job;
    }
    reduce(&job, &StatusReport::with_status(status)).job
}

fn units_report(units: Vec<ClipUnit>) -> StatusReport {
    StatusReport {
        units: Some(units),
        ..StatusReport::default()
    }
}

fn rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Queued => 0,
        JobStatus::Downloading => 1,
        JobStatus::Processing => 2,
        JobStatus::Done => 3,
        JobStatus::Error => 4,
    }
}

#[test]
fn status_never_regresses_except_to_error() {
    for from in ALL_STATUSES {
        for to in ALL_STATUSES {
            let previous = job_in(from);
            let reduction = reduce(&previous, &StatusReport::with_status(to));
            let status = reduction.job.status();

            if from.is_terminal() {
                assert_eq!(status, from, "{from} must stay terminal");
                assert!(!reduction.accepted);
            } else if to == JobStatus::Error || rank(to) >= rank(from) {
                assert_eq!(status, to, "{from} -> {to} should be accepted");
            } else {
                assert_eq!(status, from, "{from} -> {to} should be rejected");
                assert_eq!(
                    reduction.warnings,
                    vec![ReduceWarning::BackwardTransition { from, to }]
                );
            }
        }
    }
}

#[test]
fn backward_report_is_rejected_as_a_whole() {
    let previous = job_in(JobStatus::Processing);
    let report = StatusReport {
        status: Some(ReportedStatus::Known(JobStatus::Downloading)),
        source_title: Some("Should not land".to_string()),
        units: Some(vec![unit(0, "/download/j1/0")]),
        ..StatusReport::default()
    };

    let reduction = reduce(&previous, &report);

    assert!(!reduction.accepted);
    assert_eq!(reduction.job, previous);
}

#[test]
fn partial_report_keeps_previously_known_fields() {
    let job = Job::new(JobId::new("j1"));
    let titled = reduce(
        &job,
        &StatusReport {
            status: Some(JobStatus::Downloading.into()),
            source_title: Some("Launch keynote".to_string()),
            ..StatusReport::default()
        },
    )
    .job;

    let next = reduce(&titled, &StatusReport::with_status(JobStatus::Processing)).job;

    assert_eq!(next.status(), JobStatus::Processing);
    assert_eq!(next.source_title(), Some("Launch keynote"));
}

#[test]
fn units_are_merged_by_index_without_duplicates() {
    let job = job_in(JobStatus::Processing);
    let job = reduce(&job, &units_report(vec![unit(2, "c"), unit(0, "a")])).job;
    let job = reduce(&job, &units_report(vec![unit(1, "b"), unit(0, "a"), unit(2, "c")])).job;

    let indexes: Vec<u32> = job.units().iter().map(|u| u.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[test]
fn known_unit_only_changes_its_retrieval_reference() {
    let job = job_in(JobStatus::Processing);
    let job = reduce(&job, &units_report(vec![unit(0, "old")])).job;

    let mut moved = unit(0, "new");
    moved.start_offset = Duration::from_secs(999);
    let job = reduce(&job, &units_report(vec![moved])).job;

    let stored = job.unit(0).expect("unit 0");
    assert_eq!(stored.retrieval_ref, ArtifactRef::new("new"));
    assert_eq!(stored.start_offset, Duration::from_secs(0));
}

#[test]
fn unit_count_never_decreases() {
    let job = job_in(JobStatus::Processing);
    let job = reduce(&job, &units_report(vec![unit(0, "a"), unit(1, "b")])).job;
    let job = reduce(&job, &units_report(Vec::new())).job;
    let job = reduce(&job, &units_report(vec![unit(1, "b")])).job;

    assert_eq!(job.units().len(), 2);
}

#[test]
fn applying_the_same_report_twice_is_idempotent() {
    let reports = [
        StatusReport::with_status(JobStatus::Downloading),
        StatusReport {
            status: Some(JobStatus::Processing.into()),
            progress: Some(Progress::new(1, 3)),
            units: Some(vec![unit(0, "a")]),
            source_title: Some("Talk".to_string()),
            ..StatusReport::default()
        },
        StatusReport {
            status: Some(JobStatus::Done.into()),
            archive_ref: Some(ArtifactRef::new("/download/j1/all.zip")),
            ..StatusReport::default()
        },
    ];

    let mut job = Job::new(JobId::new("j1"));
    for report in &reports {
        let once = reduce(&job, report).job;
        let twice = reduce(&once, report).job;
        assert_eq!(once, twice);
        job = once;
    }
}

#[test]
fn error_detail_is_only_kept_for_failed_jobs() {
    let job = job_in(JobStatus::Downloading);
    let premature = reduce(
        &job,
        &StatusReport {
            status: Some(JobStatus::Processing.into()),
            error_detail: Some("noise".to_string()),
            ..StatusReport::default()
        },
    )
    .job;
    assert_eq!(premature.error_detail(), None);

    let failed = reduce(
        &premature,
        &StatusReport {
            status: Some(JobStatus::Error.into()),
            error_detail: Some("video unavailable".to_string()),
            ..StatusReport::default()
        },
    )
    .job;
    assert_eq!(failed.status(), JobStatus::Error);
    assert_eq!(failed.error_detail(), Some("video unavailable"));
}

#[test]
fn unrecognized_status_is_non_terminal_and_rest_still_applies() {
    let job = job_in(JobStatus::Downloading);
    let report = StatusReport {
        status: Some(ReportedStatus::parse("transcoding")),
        source_title: Some("Late title".to_string()),
        ..StatusReport::default()
    };

    let reduction = reduce(&job, &report);

    assert!(reduction.accepted);
    assert_eq!(reduction.job.status(), JobStatus::Downloading);
    assert_eq!(reduction.job.source_title(), Some("Late title"));
    assert_eq!(
        reduction.warnings,
        vec![ReduceWarning::UnrecognizedStatus("transcoding".to_string())]
    );
}

#[test]
fn report_for_another_job_is_rejected() {
    let job = job_in(JobStatus::Queued);
    let report = StatusReport {
        job_id: Some(JobId::new("j2")),
        status: Some(JobStatus::Done.into()),
        ..StatusReport::default()
    };

    let reduction = reduce(&job, &report);

    assert!(!reduction.accepted);
    assert_eq!(reduction.job.status(), JobStatus::Queued);
}

#[test]
fn progress_is_only_exposed_while_processing() {
    let job = job_in(JobStatus::Processing);
    let job = reduce(
        &job,
        &StatusReport {
            progress: Some(Progress::new(1, 3)),
            ..StatusReport::default()
        },
    )
    .job;
    assert_eq!(job.progress(), Some(Progress::new(1, 3)));

    let done = reduce(&job, &StatusReport::with_status(JobStatus::Done)).job;
    assert_eq!(done.progress(), None);
}

#[test]
fn progress_fraction_unknown_until_total_arrives() {
    assert_eq!(Progress::new(0, 0).fraction(), None);
    assert_eq!(Progress::new(1, 4).fraction(), Some(0.25));
    assert_eq!(Progress::new(9, 4).fraction(), Some(1.0));
}

#[test]
fn reduce_is_deterministic() {
    let job = job_in(JobStatus::Downloading);
    let report = StatusReport {
        status: Some(JobStatus::Processing.into()),
        units: Some(vec![unit(1, "b"), unit(0, "a")]),
        ..StatusReport::default()
    };

    assert_eq!(reduce(&job, &report), reduce(&job, &report));
}
