//! Clipper engine: talks to the clip service and executes core effects.
mod artifact;
mod engine;
mod filename;
mod persist;
mod poller;
mod service;
mod types;
mod wire;

pub use artifact::save_artifact;
pub use engine::{EngineConfig, EngineEvents, EngineHandle};
pub use filename::artifact_filename;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use poller::{poll_until_terminal, ChannelEventSink, EventSink, PollExit, PollSettings};
pub use service::{ClipService, ReqwestClipService, ServiceSettings};
pub use types::{
    ArtifactError, EngineError, EngineEvent, PollError, SubmissionError,
    GENERIC_SUBMISSION_MESSAGE,
};
