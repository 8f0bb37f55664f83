use clipper_logging::{clip_debug, clip_info};

use crate::{Effect, Msg, OrchestratorState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: OrchestratorState, msg: Msg) -> (OrchestratorState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitRequested(request) => {
            if let Some(ticket) = state.pending_submission() {
                clip_debug!("Submit ignored, submission {} still in flight", ticket);
                return (state, Vec::new());
            }
            // A new job always supersedes the previous one and its poll.
            let mut effects = state.reset();
            let ticket = state.begin_submission();
            clip_info!(
                "Submitting {} source_url={} clip_seconds={}",
                ticket,
                request.source_url,
                request.clip_duration_seconds
            );
            effects.push(Effect::Submit { ticket, request });
            effects
        }
        Msg::Submitted { ticket, job_id } => state.apply_submitted(ticket, job_id),
        Msg::SubmissionFailed { ticket, message } => {
            state.apply_submission_failed(ticket, message);
            Vec::new()
        }
        Msg::StatusReceived { job_id, report } => state.apply_status(&job_id, &report),
        Msg::PollFailed { job_id, message } => state.apply_poll_failure(&job_id, &message),
        Msg::ResetRequested => state.reset(),
        Msg::Teardown => {
            clip_debug!("Consumer detached, tearing down");
            state.reset()
        }
        Msg::ArtifactRequested(target) => state.request_artifact(target).into_iter().collect(),
        Msg::ArtifactSaved {
            job_id,
            target,
            path,
        } => {
            state.record_artifact_saved(&job_id, target, path);
            Vec::new()
        }
        Msg::ArtifactFailed {
            job_id,
            target,
            message,
        } => {
            state.record_artifact_failed(&job_id, target, &message);
            Vec::new()
        }
    };

    (state, effects)
}
