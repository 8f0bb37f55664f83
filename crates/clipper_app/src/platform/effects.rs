use std::sync::mpsc;
use std::thread;

use clipper_core::{Effect, Msg};
use clipper_engine::{EngineConfig, EngineError, EngineEvent, EngineEvents, EngineHandle};
use clipper_logging::{clip_debug, clip_info, clip_warn};

/// Executes core effects on the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, msg_tx: mpsc::Sender<Msg>) -> Result<Self, EngineError> {
        let (engine, events) = EngineHandle::new(config)?;
        spawn_event_loop(events, msg_tx);
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match &effect {
                Effect::Submit { ticket, request } => {
                    clip_info!(
                        "Submit {} url_len={} window={}",
                        ticket,
                        request.source_url.len(),
                        request.window.is_some()
                    );
                }
                Effect::StartPolling { job_id } => clip_info!("StartPolling job_id={}", job_id),
                Effect::StopPolling { job_id } => clip_info!("StopPolling job_id={}", job_id),
                Effect::DownloadArtifact { job_id, target, .. } => {
                    clip_info!("Download {} job_id={}", target, job_id);
                }
            }
            self.engine.execute(effect);
        }
    }
}

fn spawn_event_loop(events: EngineEvents, msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        while let Some(event) = events.recv() {
            match &event {
                EngineEvent::SubmissionFailed { ticket, error } => {
                    clip_warn!("Submission {} failed: {}", ticket, error);
                }
                EngineEvent::ArtifactFailed { target, error, .. } => {
                    clip_warn!("Download of {} failed: {}", target, error);
                }
                EngineEvent::PollFinished { job_id, exit } => {
                    clip_debug!("Poll for job {} finished: {:?}", job_id, exit);
                }
                _ => {}
            }
            let Some(msg) = event.into_msg() else {
                continue;
            };
            if msg_tx.send(msg).is_err() {
                break;
            }
        }
    });
}
