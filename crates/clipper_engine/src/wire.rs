//! JSON shapes exchanged with the clip service.
//!
//! Field names follow the service's camelCase convention; the snake_case and
//! short names older service builds emit are accepted too, each in a field of
//! its own.

use std::time::Duration;

use clipper_core::{
    ArtifactRef, ClipRequest, ClipUnit, JobId, Progress, ReportedStatus, StatusReport,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitBody<'a> {
    source_url: &'a str,
    clip_duration_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<String>,
}

impl<'a> From<&'a ClipRequest> for SubmitBody<'a> {
    fn from(request: &'a ClipRequest) -> Self {
        Self {
            source_url: &request.source_url,
            clip_duration_seconds: request.clip_duration_seconds,
            start: request.window.map(|window| window.start_label()),
            end: request.window.map(|window| window.end_label()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitAccepted {
    #[serde(alias = "job_id")]
    pub(crate) job_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    detail: Value,
}

impl ErrorBody {
    /// `detail` is either a plain message or a list of validation errors
    /// carrying a `msg` each.
    pub(crate) fn message(&self) -> Option<String> {
        match &self.detail {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        }
    }
}

/// Every accepted spelling gets its own field so a body carrying two of them
/// still parses; the camelCase name wins.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusBody {
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default, rename = "job_id")]
    job_id_snake: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    progress: Option<ProgressBody>,
    #[serde(default)]
    units: Option<Vec<UnitBody>>,
    #[serde(default)]
    clips: Option<Vec<UnitBody>>,
    #[serde(default)]
    source_title: Option<String>,
    #[serde(default, rename = "source_title")]
    source_title_snake: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    error_detail: Option<String>,
    #[serde(default, rename = "error_detail")]
    error_detail_snake: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    archive_ref: Option<String>,
    #[serde(default, rename = "archive_ref")]
    archive_ref_snake: Option<String>,
    #[serde(default)]
    zip_url: Option<String>,
    #[serde(default, rename = "zip_url")]
    zip_url_snake: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressBody {
    #[serde(default)]
    completed: Option<u32>,
    #[serde(default)]
    completed_units: Option<u32>,
    #[serde(default, rename = "completed_units")]
    completed_units_snake: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    total_units: Option<u32>,
    #[serde(default, rename = "total_units")]
    total_units_snake: Option<u32>,
}

impl ProgressBody {
    fn into_progress(self) -> Result<Progress, String> {
        let completed = self
            .completed
            .or(self.completed_units)
            .or(self.completed_units_snake)
            .ok_or("progress has no completed count")?;
        let total = self
            .total
            .or(self.total_units)
            .or(self.total_units_snake)
            .ok_or("progress has no total count")?;
        Ok(Progress::new(completed, total))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnitBody {
    index: u32,
    #[serde(default)]
    start_offset: Option<f64>,
    #[serde(default, rename = "start_offset")]
    start_offset_snake: Option<f64>,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    retrieval_reference: Option<String>,
    #[serde(default, rename = "retrieval_reference")]
    retrieval_reference_snake: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl StatusBody {
    pub(crate) fn into_report(self) -> Result<StatusReport, String> {
        let units = self
            .units
            .or(self.clips)
            .map(|units| units.into_iter().map(UnitBody::into_unit).collect())
            .transpose()?;

        Ok(StatusReport {
            job_id: self.job_id.or(self.job_id_snake).map(JobId::new),
            status: self.status.as_deref().map(ReportedStatus::parse),
            progress: self.progress.map(ProgressBody::into_progress).transpose()?,
            units,
            source_title: self.source_title.or(self.source_title_snake).or(self.title),
            error_detail: self
                .error_detail
                .or(self.error_detail_snake)
                .or(self.detail)
                .or(self.error),
            archive_ref: self
                .archive_ref
                .or(self.archive_ref_snake)
                .or(self.zip_url)
                .or(self.zip_url_snake)
                .map(ArtifactRef::new),
        })
    }
}

impl UnitBody {
    fn into_unit(self) -> Result<ClipUnit, String> {
        let index = self.index;
        let reference = self
            .retrieval_reference
            .or(self.retrieval_reference_snake)
            .or(self.download_url)
            .or(self.url)
            .filter(|reference| !reference.trim().is_empty())
            .ok_or_else(|| format!("unit {index} has no reference"))?;
        let start_offset = self
            .start_offset
            .or(self.start_offset_snake)
            .or(self.start)
            .unwrap_or_default();
        Ok(ClipUnit {
            index,
            start_offset: seconds(start_offset, "start offset", index)?,
            duration: seconds(self.duration, "duration", index)?,
            retrieval_ref: ArtifactRef::new(reference),
        })
    }
}

fn seconds(value: f64, field: &str, index: u32) -> Result<Duration, String> {
    Duration::try_from_secs_f64(value)
        .map_err(|err| format!("unit {index} has an invalid {field} {value}: {err}"))
}
