//! `clipper.ron`: service location, polling policy and download settings.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clipper_core::PollPolicy;
use clipper_engine::{EngineConfig, PollSettings, ServiceSettings};
use clipper_logging::clip_info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub clip_duration_seconds: u32,
    pub poll_interval_ms: u64,
    /// Consecutive failed polls before the job is given up on.
    pub max_consecutive_poll_failures: u32,
    pub still_working_after_polls: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_artifact_bytes: u64,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let service = ServiceSettings::default();
        let policy = PollPolicy::default();
        Self {
            base_url: service.base_url,
            clip_duration_seconds: 30,
            poll_interval_ms: 2000,
            max_consecutive_poll_failures: policy.max_consecutive_failures,
            still_working_after_polls: policy.still_working_after_polls,
            connect_timeout_secs: service.connect_timeout.as_secs(),
            request_timeout_secs: service.request_timeout.as_secs(),
            max_artifact_bytes: service.max_artifact_bytes,
            output_dir: PathBuf::from("clips"),
        }
    }
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        let config: Self = ron::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        clip_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.clip_duration_seconds == 0 {
            bail!("clip_duration_seconds must be positive");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be positive");
        }
        if self.max_consecutive_poll_failures == 0 {
            bail!("max_consecutive_poll_failures must be positive");
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            bail!("timeouts must be positive");
        }
        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_consecutive_failures: self.max_consecutive_poll_failures,
            still_working_after_polls: self.still_working_after_polls,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            service: ServiceSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                max_artifact_bytes: self.max_artifact_bytes,
            },
            poll: PollSettings {
                interval: Duration::from_millis(self.poll_interval_ms),
            },
            output_dir: self.output_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(&temp.path().join("clipper.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clipper.ron");
        fs::write(
            &path,
            r#"(base_url: "https://clips.example/api", poll_interval_ms: 500)"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "https://clips.example/api");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.clip_duration_seconds, 30);

        let engine = config.engine_config();
        assert_eq!(engine.poll.interval, Duration::from_millis(500));
        assert_eq!(engine.service.base_url, "https://clips.example/api");
    }

    #[test]
    fn written_config_loads_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clipper.ron");
        let config = AppConfig {
            max_consecutive_poll_failures: 3,
            output_dir: PathBuf::from("/tmp/clips"),
            ..AppConfig::default()
        };
        let text =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new()).unwrap();
        fs::write(&path, text).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clipper.ron");
        fs::write(&path, "(base_url: 42").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = AppConfig {
            poll_interval_ms: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(AppConfig::default().validate().is_ok());
    }
}
