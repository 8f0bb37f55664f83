use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use clipper_core::{ClipRequest, ClipWindow};

use crate::config::AppConfig;

/// Command line for one clipping run.
#[derive(Debug, Parser)]
#[command(name = "clipper")]
#[command(about = "Cut a long video into short clips with the clip service", long_about = None)]
pub struct Cli {
    /// Source video URL (http or https).
    pub url: String,

    /// Length of each clip in seconds.
    #[arg(long, short = 'd')]
    pub clip_seconds: Option<u32>,

    /// Start of the window to clip, as HH:MM:SS, MM:SS or SS.
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// End of the window to clip.
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Configuration file; missing means defaults.
    #[arg(long, default_value = "clipper.ron")]
    pub config: PathBuf,

    /// Base URL of the clip service.
    #[arg(long)]
    pub server: Option<String>,

    /// Directory downloaded clips are written to.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// What to download once the job is done.
    #[arg(long, value_enum, default_value_t = DownloadChoice::All)]
    pub download: DownloadChoice,

    /// Log debug output.
    #[arg(long, short)]
    pub verbose: bool,

    /// Also write the log to ./clipper.log.
    #[arg(long)]
    pub log_file: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DownloadChoice {
    /// Every clip and the archive, when offered.
    All,
    /// Every clip.
    Units,
    /// Only the archive; falls back to the clips when none is offered.
    Archive,
    /// Nothing; only list the results.
    #[value(name = "none")]
    Skip,
}

impl Cli {
    /// Command-line values win over the configuration file.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(server) = &self.server {
            config.base_url = server.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(seconds) = self.clip_seconds {
            config.clip_duration_seconds = seconds;
        }
    }

    pub fn request(&self, config: &AppConfig) -> Result<ClipRequest> {
        let request = ClipRequest::new(self.url.trim(), config.clip_duration_seconds);
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => {
                let window = ClipWindow::parse(start, end)
                    .with_context(|| format!("invalid window {start}..{end}"))?;
                Ok(request.with_window(window))
            }
            _ => Ok(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("clipper").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "https://youtu.be/abc123",
            "--server",
            "http://clips.local:9000",
            "-d",
            "45",
            "--output",
            "out",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.base_url, "http://clips.local:9000");
        assert_eq!(config.clip_duration_seconds, 45);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(cli.download, DownloadChoice::All);
    }

    #[test]
    fn window_is_parsed_into_the_request() {
        let cli = parse(&["https://youtu.be/abc123", "--start", "1:00", "--end", "2:30"]);
        let request = cli.request(&AppConfig::default()).unwrap();
        let window = request.window.unwrap();
        assert_eq!(window.start(), Duration::from_secs(60));
        assert_eq!(window.end(), Duration::from_secs(150));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let cli = parse(&["https://youtu.be/abc123", "--start", "2:00", "--end", "1:00"]);
        assert!(cli.request(&AppConfig::default()).is_err());
    }

    #[test]
    fn start_without_end_is_a_usage_error() {
        let result =
            Cli::try_parse_from(["clipper", "https://youtu.be/abc123", "--start", "1:00"]);
        assert!(result.is_err());
    }

    #[test]
    fn download_none_maps_to_skip() {
        let cli = parse(&["https://youtu.be/abc123", "--download", "none"]);
        assert_eq!(cli.download, DownloadChoice::Skip);
    }
}
