#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clipper_core::{
    ArtifactRef, ClipRequest, ClipUnit, JobId, JobStatus, Progress, StatusReport,
};
use clipper_engine::{
    ArtifactError, ClipService, EngineEvent, EventSink, PollError, SubmissionError,
};

#[derive(Default)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Answers status calls from a script, one entry per call. Once the script
/// runs out every call reports `Processing`.
pub struct ScriptedService {
    job_id: JobId,
    script: Mutex<VecDeque<Result<StatusReport, PollError>>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    artifact: Vec<u8>,
}

impl ScriptedService {
    pub fn new(job_id: &str, script: Vec<Result<StatusReport, PollError>>) -> Self {
        Self {
            job_id: JobId::new(job_id),
            script: Mutex::new(script.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            artifact: b"clip-bytes".to_vec(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ClipService for ScriptedService {
    async fn submit(&self, _request: &ClipRequest) -> Result<JobId, SubmissionError> {
        Ok(self.job_id.clone())
    }

    async fn status(&self, _job_id: &JobId) -> Result<StatusReport, PollError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusReport::with_status(JobStatus::Processing)))
    }

    async fn fetch_artifact(&self, _reference: &ArtifactRef) -> Result<Vec<u8>, ArtifactError> {
        Ok(self.artifact.clone())
    }
}

pub fn unit(index: u32) -> ClipUnit {
    ClipUnit {
        index,
        start_offset: Duration::from_secs(u64::from(index) * 30),
        duration: Duration::from_secs(30),
        retrieval_ref: ArtifactRef::new(format!("/download/j1/{index}")),
    }
}

pub fn processing(completed: u32, total: u32, units: Vec<ClipUnit>) -> StatusReport {
    StatusReport {
        progress: Some(Progress::new(completed, total)),
        units: Some(units),
        ..StatusReport::with_status(JobStatus::Processing)
    }
}

/// The report sequence of a three-clip job that finishes normally.
pub fn happy_script() -> Vec<Result<StatusReport, PollError>> {
    vec![
        Ok(StatusReport::with_status(JobStatus::Queued)),
        Ok(StatusReport {
            source_title: Some("Keynote".to_string()),
            ..StatusReport::with_status(JobStatus::Downloading)
        }),
        Ok(processing(1, 3, vec![unit(0)])),
        Ok(processing(3, 3, vec![unit(0), unit(1), unit(2)])),
        Ok(StatusReport {
            archive_ref: Some(ArtifactRef::new("/download/j1/all.zip")),
            ..StatusReport::with_status(JobStatus::Done)
        }),
    ]
}
