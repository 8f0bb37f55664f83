use std::time::Duration;

use url::Url;

use crate::timestamp::{format_timestamp, parse_timestamp, TimestampError, MAX_TIMESTAMP};

/// What the user asks the service to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    pub source_url: String,
    pub clip_duration_seconds: u32,
    /// Restricts extraction to a section of the source.
    pub window: Option<ClipWindow>,
}

impl ClipRequest {
    pub fn new(source_url: impl Into<String>, clip_duration_seconds: u32) -> Self {
        Self {
            source_url: source_url.into(),
            clip_duration_seconds,
            window: None,
        }
    }

    pub fn with_window(mut self, window: ClipWindow) -> Self {
        self.window = Some(window);
        self
    }
}

/// A validated `[start, end)` section of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    start: Duration,
    end: Duration,
}

impl ClipWindow {
    pub fn new(start: Duration, end: Duration) -> Result<Self, TimestampError> {
        if start > MAX_TIMESTAMP || end > MAX_TIMESTAMP {
            return Err(TimestampError::TooLong);
        }
        if end <= start {
            return Err(TimestampError::EndNotAfterStart);
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, TimestampError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn end(&self) -> Duration {
        self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    pub fn start_label(&self) -> String {
        format_timestamp(self.start)
    }

    pub fn end_label(&self) -> String {
        format_timestamp(self.end)
    }
}

/// Accept/reject predicate for the source URL field: absolute http(s) with a host.
pub fn is_supported_source_url(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
