use clipper_core::{ArtifactTarget, JobId};
use sha2::{Digest, Sha256};

const MAX_STEM_LEN: usize = 60;

/// Portable, deterministic name for a downloaded artifact:
/// `{title}--{job hash}--clip-{NN}.mp4` or `{title}--{job hash}--clips.zip`.
pub fn artifact_filename(title: Option<&str>, job_id: &JobId, target: ArtifactTarget) -> String {
    let stem = title.map(sanitize_stem).unwrap_or_else(|| "clip".to_string());
    let hash = short_hash(job_id.as_str());
    match target {
        ArtifactTarget::Unit(index) => {
            format!("{stem}--{hash}--clip-{:02}.mp4", u64::from(index) + 1)
        }
        ArtifactTarget::Archive => format!("{stem}--{hash}--clips.zip"),
    }
}

fn sanitize_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        let mapped = if is_forbidden(c) || c.is_whitespace() { '_' } else { c };
        // Collapse runs of replacement characters.
        if mapped == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(mapped);
    }

    let mut stem = stem.trim_matches(&['_', '.', ' '][..]).to_string();
    if stem.chars().count() > MAX_STEM_LEN {
        stem = stem.chars().take(MAX_STEM_LEN).collect();
        stem = stem.trim_end_matches(&['_', '.'][..]).to_string();
    }
    if stem.is_empty() || is_reserved_windows_name(&stem) {
        stem.insert_str(0, "clip_");
        stem = stem.trim_end_matches('_').to_string();
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect()
}
