use std::path::PathBuf;

use clipper_core::{ArtifactRef, ArtifactTarget, JobId};
use clipper_logging::clip_info;

use crate::{artifact_filename, ArtifactError, AtomicFileWriter, ClipService};

/// Downloads one artifact and stores it under its deterministic file name.
pub async fn save_artifact(
    service: &dyn ClipService,
    writer: &AtomicFileWriter,
    job_id: &JobId,
    target: ArtifactTarget,
    reference: &ArtifactRef,
    source_title: Option<&str>,
) -> Result<PathBuf, ArtifactError> {
    let bytes = service.fetch_artifact(reference).await?;
    let filename = artifact_filename(source_title, job_id, target);
    let path = writer
        .write(&filename, &bytes)
        .map_err(|err| ArtifactError::Persist(err.to_string()))?;
    clip_info!(
        "Stored {} of job {} ({} bytes) at {:?}",
        target,
        job_id,
        bytes.len(),
        path
    );
    Ok(path)
}
