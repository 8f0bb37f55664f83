use std::time::Duration;

use clipper_core::{ArtifactRef, ClipRequest, JobId, StatusReport};
use clipper_logging::clip_debug;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::wire::{ErrorBody, StatusBody, SubmitAccepted, SubmitBody};
use crate::{ArtifactError, EngineError, PollError, SubmissionError};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_artifact_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_artifact_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

/// The remote processing service, as far as the orchestrator cares.
#[async_trait::async_trait]
pub trait ClipService: Send + Sync {
    async fn submit(&self, request: &ClipRequest) -> Result<JobId, SubmissionError>;

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, PollError>;

    async fn fetch_artifact(&self, reference: &ArtifactRef) -> Result<Vec<u8>, ArtifactError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClipService {
    base: Url,
    client: reqwest::Client,
    request_timeout: Duration,
    max_artifact_bytes: u64,
}

impl ReqwestClipService {
    pub fn new(settings: &ServiceSettings) -> Result<Self, EngineError> {
        let base = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))?;
        Ok(Self {
            base,
            client,
            request_timeout: settings.request_timeout,
            max_artifact_bytes: settings.max_artifact_bytes,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Absolute references are used as-is, relative ones resolve against the base.
    fn resolve(&self, reference: &ArtifactRef) -> Result<Url, ArtifactError> {
        let raw = reference.as_str().trim();
        let resolved = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base
                .join(raw)
                .map_err(|_| ArtifactError::InvalidReference(raw.to_string()))?,
            Err(_) => return Err(ArtifactError::InvalidReference(raw.to_string())),
        };
        if matches!(resolved.scheme(), "http" | "https") {
            Ok(resolved)
        } else {
            Err(ArtifactError::InvalidReference(raw.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl ClipService for ReqwestClipService {
    async fn submit(&self, request: &ClipRequest) -> Result<JobId, SubmissionError> {
        let body = serde_json::to_vec(&SubmitBody::from(request))
            .map_err(|err| SubmissionError::Malformed(err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint(&["clip"]))
            .timeout(self.request_timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| SubmissionError::Network(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| SubmissionError::Network(err.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message());
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let accepted: SubmitAccepted = serde_json::from_slice(&bytes)
            .map_err(|err| SubmissionError::Malformed(err.to_string()))?;
        if accepted.job_id.trim().is_empty() {
            return Err(SubmissionError::Malformed("empty job id".to_string()));
        }
        Ok(JobId::new(accepted.job_id))
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, PollError> {
        let url = self.endpoint(&["status", job_id.as_str()]);
        clip_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_poll_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(map_poll_error)?;
        let body: StatusBody =
            serde_json::from_slice(&bytes).map_err(|err| PollError::Malformed(err.to_string()))?;
        body.into_report().map_err(PollError::Malformed)
    }

    // Artifacts may take far longer than a status call; only the connect
    // timeout applies here.
    async fn fetch_artifact(&self, reference: &ArtifactRef) -> Result<Vec<u8>, ArtifactError> {
        let url = self.resolve(reference)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| ArtifactError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArtifactError::HttpStatus(status.as_u16()));
        }

        let max_bytes = self.max_artifact_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ArtifactError::TooLarge {
                    max_bytes,
                    actual: Some(content_len),
                });
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| ArtifactError::Network(err.to_string()))?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ArtifactError::TooLarge {
                    max_bytes,
                    actual: Some(next_len),
                });
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

/// Parses the base url and makes sure it ends in `/` so relative joins stay below it.
fn parse_base_url(raw: &str) -> Result<Url, EngineError> {
    let invalid = |reason: String| EngineError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid("expected an http(s) url".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn map_poll_error(err: reqwest::Error) -> PollError {
    if err.is_timeout() {
        return PollError::Timeout(err.to_string());
    }
    PollError::Network(err.to_string())
}
