use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use clipper_core::{ArtifactRef, ArtifactTarget, ClipRequest, Effect, JobId, SubmissionTicket};
use clipper_logging::{clip_debug, clip_info};
use tokio_util::sync::CancellationToken;

use crate::poller::{poll_until_terminal, ChannelEventSink, EventSink, PollSettings};
use crate::{
    save_artifact, ArtifactError, AtomicFileWriter, ClipService, EngineError, EngineEvent,
    ReqwestClipService, ServiceSettings,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub service: ServiceSettings,
    pub poll: PollSettings,
    pub output_dir: PathBuf,
}

enum EngineCommand {
    Submit {
        ticket: SubmissionTicket,
        request: ClipRequest,
    },
    StartPolling {
        job_id: JobId,
    },
    StopPolling {
        job_id: JobId,
    },
    Download {
        job_id: JobId,
        target: ArtifactTarget,
        reference: ArtifactRef,
        source_title: Option<String>,
    },
    Shutdown,
}

/// Command side of the engine. Dropping it stops every running task.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

/// Event side of the engine, usually moved to a forwarding thread.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineEvents {
    /// Blocks for the next event; `None` once the engine has shut down.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout`; `None` on timeout or once the engine is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct ActivePoll {
    job_id: JobId,
    cancel: CancellationToken,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<(Self, EngineEvents), EngineError> {
        let service = Arc::new(ReqwestClipService::new(&config.service)?);
        Self::with_service(service, config)
    }

    /// Runs the engine against any service implementation.
    pub fn with_service(
        service: Arc<dyn ClipService>,
        config: EngineConfig,
    ) -> Result<(Self, EngineEvents), EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("clipper-engine")
            .enable_all()
            .build()?;
        let writer = Arc::new(AtomicFileWriter::new(config.output_dir.clone()));

        thread::spawn(move || {
            let shutdown = CancellationToken::new();
            let mut active_poll: Option<ActivePoll> = None;

            while let Ok(command) = cmd_rx.recv() {
                let sink = ChannelEventSink::new(event_tx.clone());
                match command {
                    EngineCommand::Submit { ticket, request } => {
                        let service = service.clone();
                        let cancel = shutdown.child_token();
                        runtime.spawn(async move {
                            let outcome = tokio::select! {
                                _ = cancel.cancelled() => return,
                                outcome = service.submit(&request) => outcome,
                            };
                            sink.emit(match outcome {
                                Ok(job_id) => EngineEvent::Submitted { ticket, job_id },
                                Err(error) => EngineEvent::SubmissionFailed { ticket, error },
                            });
                        });
                    }
                    EngineCommand::StartPolling { job_id } => {
                        // Only one poll loop per engine.
                        if let Some(previous) = active_poll.take() {
                            clip_debug!("Superseding poll for job {}", previous.job_id);
                            previous.cancel.cancel();
                        }
                        let cancel = shutdown.child_token();
                        active_poll = Some(ActivePoll {
                            job_id: job_id.clone(),
                            cancel: cancel.clone(),
                        });
                        let service = service.clone();
                        let settings = config.poll.clone();
                        runtime.spawn(async move {
                            let exit = poll_until_terminal(
                                service.as_ref(),
                                &job_id,
                                &settings,
                                &cancel,
                                &sink,
                            )
                            .await;
                            sink.emit(EngineEvent::PollFinished { job_id, exit });
                        });
                    }
                    EngineCommand::StopPolling { job_id } => {
                        if active_poll.as_ref().is_some_and(|poll| poll.job_id == job_id) {
                            if let Some(poll) = active_poll.take() {
                                clip_debug!("Stopping poll for job {}", poll.job_id);
                                poll.cancel.cancel();
                            }
                        }
                    }
                    EngineCommand::Download {
                        job_id,
                        target,
                        reference,
                        source_title,
                    } => {
                        let service = service.clone();
                        let writer = writer.clone();
                        let cancel = shutdown.child_token();
                        runtime.spawn(async move {
                            let result = tokio::select! {
                                _ = cancel.cancelled() => Err(ArtifactError::Cancelled),
                                result = save_artifact(
                                    service.as_ref(),
                                    &writer,
                                    &job_id,
                                    target,
                                    &reference,
                                    source_title.as_deref(),
                                ) => result,
                            };
                            sink.emit(match result {
                                Ok(path) => EngineEvent::ArtifactSaved {
                                    job_id,
                                    target,
                                    path,
                                },
                                Err(error) => EngineEvent::ArtifactFailed {
                                    job_id,
                                    target,
                                    error,
                                },
                            });
                        });
                    }
                    EngineCommand::Shutdown => break,
                }
            }

            clip_info!("Engine shutting down");
            shutdown.cancel();
            runtime.shutdown_timeout(Duration::from_millis(500));
        });

        Ok((Self { cmd_tx }, EngineEvents { event_rx }))
    }

    /// Carries out one effect produced by the core update.
    pub fn execute(&self, effect: Effect) {
        match effect {
            Effect::Submit { ticket, request } => self.submit(ticket, request),
            Effect::StartPolling { job_id } => self.start_polling(job_id),
            Effect::StopPolling { job_id } => self.stop_polling(job_id),
            Effect::DownloadArtifact {
                job_id,
                target,
                reference,
                source_title,
            } => self.download(job_id, target, reference, source_title),
        }
    }

    pub fn submit(&self, ticket: SubmissionTicket, request: ClipRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { ticket, request });
    }

    pub fn start_polling(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling { job_id });
    }

    /// Idempotent; a stop for a job that is not being polled is ignored.
    pub fn stop_polling(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::StopPolling { job_id });
    }

    pub fn download(
        &self,
        job_id: JobId,
        target: ArtifactTarget,
        reference: ArtifactRef,
        source_title: Option<String>,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::Download {
            job_id,
            target,
            reference,
            source_title,
        });
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}
