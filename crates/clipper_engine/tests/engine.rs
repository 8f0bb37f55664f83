mod common;

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clipper_core::{
    update, ArtifactTarget, ClipRequest, JobId, JobStatus, Msg, OrchestratorState, Phase,
    StatusReport, LOST_CONTACT_MESSAGE,
};
use clipper_engine::{EngineConfig, EngineEvents, EngineHandle, PollSettings, ServiceSettings};
use common::{happy_script, ScriptedService};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(output: &TempDir) -> EngineConfig {
    EngineConfig {
        service: ServiceSettings::default(),
        poll: PollSettings {
            interval: Duration::from_millis(10),
        },
        output_dir: output.path().to_path_buf(),
    }
}

fn dispatch(state: OrchestratorState, msg: Msg, engine: &EngineHandle) -> OrchestratorState {
    let (state, effects) = update(state, msg);
    for effect in effects {
        engine.execute(effect);
    }
    state
}

/// Feeds engine events through `update` until `done` holds or five seconds pass.
fn run_until(
    mut state: OrchestratorState,
    engine: &EngineHandle,
    events: &EngineEvents,
    done: impl Fn(&OrchestratorState) -> bool,
) -> OrchestratorState {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(&state) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        assert!(!remaining.is_zero(), "timed out in phase {}", state.phase());
        if let Some(msg) = events.recv_timeout(remaining).and_then(|e| e.into_msg()) {
            state = dispatch(state, msg, engine);
        }
    }
    state
}

fn submit(state: OrchestratorState, engine: &EngineHandle) -> OrchestratorState {
    let request = ClipRequest::new("https://youtu.be/abc123", 30);
    dispatch(state, Msg::SubmitRequested(request), engine)
}

#[test]
fn job_runs_to_results_and_artifacts_are_saved() {
    let output = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new("j1", happy_script()));
    let (engine, events) = EngineHandle::with_service(service.clone(), config(&output)).unwrap();

    let state = submit(OrchestratorState::new(), &engine);
    let state = run_until(state, &engine, &events, |s| s.phase() == Phase::Results);

    let job = state.job().unwrap();
    assert_eq!(job.status(), JobStatus::Done);
    assert_eq!(job.units().len(), 3);
    assert_eq!(job.source_title(), Some("Keynote"));
    assert_eq!(service.calls(), 5);

    let state = dispatch(
        state,
        Msg::ArtifactRequested(ArtifactTarget::Unit(0)),
        &engine,
    );
    let state = dispatch(state, Msg::ArtifactRequested(ArtifactTarget::Archive), &engine);
    let state = run_until(state, &engine, &events, |s| s.view().saved_artifacts.len() == 2);

    for saved in state.view().saved_artifacts {
        assert!(saved.path.starts_with(output.path()));
        assert_eq!(fs::read(&saved.path).unwrap(), b"clip-bytes");
    }
    assert!(state.last_error().is_none());
}

#[test]
fn reset_while_processing_stops_polling() {
    let output = TempDir::new().unwrap();
    // Empty script: the job stays in processing forever.
    let service = Arc::new(ScriptedService::new("j1", Vec::new()));
    let (engine, events) = EngineHandle::with_service(service.clone(), config(&output)).unwrap();

    let state = submit(OrchestratorState::new(), &engine);
    let state = run_until(state, &engine, &events, |s| {
        s.job().is_some_and(|job| job.status() == JobStatus::Processing)
    });
    let mut state = dispatch(state, Msg::ResetRequested, &engine);
    assert_eq!(state.phase(), Phase::Input);
    assert!(state.job().is_none());

    std::thread::sleep(Duration::from_millis(100));
    let calls_after_reset = service.calls();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(service.calls(), calls_after_reset);

    // Whatever was already queued has no effect on the reset state.
    while let Some(event) = events.try_recv() {
        if let Some(msg) = event.into_msg() {
            state = dispatch(state, msg, &engine);
        }
    }
    assert_eq!(state.phase(), Phase::Input);
    assert!(state.job().is_none());
}

#[test]
fn reports_for_another_job_end_in_lost_contact() {
    let output = TempDir::new().unwrap();
    let foreign_done = StatusReport {
        job_id: Some(JobId::new("other")),
        ..StatusReport::with_status(JobStatus::Done)
    };
    let script = (0..5).map(|_| Ok(foreign_done.clone())).collect();
    let service = Arc::new(ScriptedService::new("j1", script));
    let (engine, events) = EngineHandle::with_service(service.clone(), config(&output)).unwrap();

    let state = submit(OrchestratorState::new(), &engine);
    let state = run_until(state, &engine, &events, |s| {
        s.phase() == Phase::Input && s.pending_submission().is_none()
    });

    assert_eq!(state.last_error(), Some(LOST_CONTACT_MESSAGE));
    assert_eq!(state.job().map(|job| job.status()), Some(JobStatus::Queued));
    assert!(service.calls() >= 5);
}

#[test]
fn new_submission_supersedes_the_running_job() {
    let output = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new("j1", Vec::new()));
    let (engine, events) = EngineHandle::with_service(service.clone(), config(&output)).unwrap();

    let state = submit(OrchestratorState::new(), &engine);
    let state = run_until(state, &engine, &events, |s| s.phase() == Phase::Processing);
    let state = submit(state, &engine);
    assert_eq!(state.phase(), Phase::Input);
    assert!(state.pending_submission().is_some());

    let state = run_until(state, &engine, &events, |s| s.phase() == Phase::Processing);
    assert!(state.pending_submission().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn http_job_reaches_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "j1" })))
        .mount(&server)
        .await;
    let reports = [
        json!({ "status": "queued" }),
        json!({ "status": "processing", "progress": { "completed": 1, "total": 2 } }),
        json!({
            "status": "done",
            "sourceTitle": "Talk",
            "units": [
                { "index": 0, "startOffset": 0, "duration": 30, "url": "/download/j1/0" },
                { "index": 1, "startOffset": 30, "duration": 30, "url": "/download/j1/1" }
            ]
        }),
    ];
    for report in reports {
        Mock::given(method("GET"))
            .and(path("/status/j1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(report))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }

    let output = TempDir::new().unwrap();
    let config = EngineConfig {
        service: ServiceSettings {
            base_url: server.uri(),
            ..ServiceSettings::default()
        },
        ..config(&output)
    };

    let state = tokio::task::spawn_blocking(move || {
        let (engine, events) = EngineHandle::new(config).unwrap();
        let state = submit(OrchestratorState::new(), &engine);
        run_until(state, &engine, &events, |s| s.phase() == Phase::Results)
    })
    .await
    .unwrap();

    let job = state.job().unwrap();
    assert_eq!(job.status(), JobStatus::Done);
    assert_eq!(job.units().len(), 2);
    assert_eq!(state.view().clip_count(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_rejection_returns_to_input_with_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clip"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "invalid URL" })))
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let config = EngineConfig {
        service: ServiceSettings {
            base_url: server.uri(),
            ..ServiceSettings::default()
        },
        ..config(&output)
    };

    let state = tokio::task::spawn_blocking(move || {
        let (engine, events) = EngineHandle::new(config).unwrap();
        let state = submit(OrchestratorState::new(), &engine);
        run_until(state, &engine, &events, |s| s.pending_submission().is_none())
    })
    .await
    .unwrap();

    assert_eq!(state.phase(), Phase::Input);
    assert!(state.job().is_none());
    assert_eq!(state.last_error(), Some("invalid URL"));
}
