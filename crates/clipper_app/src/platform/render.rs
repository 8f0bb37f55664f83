use clipper_core::{format_timestamp, AppViewModel, JobStatus, Phase};

/// One-line summary of the current view.
pub fn status_line(view: &AppViewModel) -> String {
    match view.phase {
        Phase::Input if view.submitting => "Submitting...".to_string(),
        Phase::Input => {
            let failed = view.job.as_ref().is_some_and(|job| job.status() == JobStatus::Error);
            match &view.error {
                Some(error) if failed => format!("Failed: {error}"),
                Some(error) => format!("Error: {error}"),
                None => "Ready".to_string(),
            }
        }
        Phase::Processing => {
            let Some(job) = &view.job else {
                return "Processing".to_string();
            };
            let name = job.source_title().unwrap_or(job.id().as_str());
            let mut line = match view.progress().and_then(|p| p.fraction().map(|f| (p, f))) {
                Some((progress, fraction)) => format!(
                    "[{}] {}: {}/{} clips ({:.0}%)",
                    job.status(),
                    name,
                    progress.completed,
                    progress.total,
                    fraction * 100.0
                ),
                None => format!("[{}] {}", job.status(), name),
            };
            if view.still_working {
                line.push_str(" (still working, this can take a while)");
            }
            line
        }
        Phase::Results => format!("Done: {} clips ready", view.clip_count()),
    }
}

/// Clip listing shown once the job is done.
pub fn results(view: &AppViewModel) -> Vec<String> {
    let Some(job) = &view.job else {
        return Vec::new();
    };
    let mut lines: Vec<String> = job
        .units()
        .iter()
        .map(|unit| {
            format!(
                "  clip {:>2}  {} +{}s  {}",
                u64::from(unit.index) + 1,
                format_timestamp(unit.start_offset),
                unit.duration.as_secs(),
                unit.retrieval_ref
            )
        })
        .collect();
    if let Some(archive) = job.archive_ref() {
        lines.push(format!("  archive  {archive}"));
    }
    for saved in &view.saved_artifacts {
        lines.push(format!("  saved {} -> {}", saved.target, saved.path.display()));
    }
    lines
}
