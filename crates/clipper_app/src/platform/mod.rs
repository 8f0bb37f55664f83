mod effects;
mod render;
mod session;

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use clipper_core::{
    is_supported_source_url, AppViewModel, ArtifactTarget, Msg, OrchestratorState, Phase,
};
use clipper_engine::ensure_output_dir;
use clipper_logging::{clip_info, LogDestination};
use log::LevelFilter;

use crate::cli::{Cli, DownloadChoice};
use crate::config::AppConfig;
use effects::EffectRunner;
use session::Session;

const LOG_FILE: &str = "./clipper.log";

pub fn run_app() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut config = AppConfig::load(&cli.config)?;
    cli.apply(&mut config);
    config.validate()?;
    let request = cli.request(&config)?;
    if !is_supported_source_url(&request.source_url) {
        bail!("{} is not an http(s) URL", request.source_url);
    }
    if cli.download != DownloadChoice::Skip {
        ensure_output_dir(&config.output_dir)
            .with_context(|| format!("output directory {}", config.output_dir.display()))?;
    }
    clip_info!("Using clip service at {}", config.base_url);

    let (msg_tx, msg_rx) = mpsc::channel();
    let runner = EffectRunner::new(config.engine_config(), msg_tx)?;
    let mut session = Session::new(OrchestratorState::with_policy(config.poll_policy()), runner);

    show(session.dispatch(Msg::SubmitRequested(request)));

    let mut outstanding: Option<usize> = None;
    let mut failed = 0usize;
    loop {
        let msg = msg_rx
            .recv()
            .map_err(|_| anyhow!("clip engine stopped unexpectedly"))?;
        let download_finished = match &msg {
            Msg::ArtifactSaved { .. } => true,
            Msg::ArtifactFailed { .. } => {
                failed += 1;
                true
            }
            _ => false,
        };
        show(session.dispatch(msg));

        let state = session.state();
        match state.phase() {
            Phase::Input if state.pending_submission().is_none() => {
                let error = state.last_error().unwrap_or("job was abandoned");
                bail!("{error}");
            }
            Phase::Results => {
                let view = state.view();
                match outstanding {
                    None => {
                        for line in render::results(&view) {
                            println!("{line}");
                        }
                        let targets = artifact_targets(&view, cli.download);
                        if targets.is_empty() {
                            break;
                        }
                        outstanding = Some(targets.len());
                        for target in targets {
                            show(session.dispatch(Msg::ArtifactRequested(target)));
                        }
                    }
                    Some(remaining) => {
                        let remaining = if download_finished {
                            remaining.saturating_sub(1)
                        } else {
                            remaining
                        };
                        if remaining == 0 {
                            break;
                        }
                        outstanding = Some(remaining);
                    }
                }
            }
            _ => {}
        }
    }

    for saved in &session.state().view().saved_artifacts {
        println!("Saved {} to {}", saved.target, saved.path.display());
    }
    if failed > 0 {
        bail!("{failed} download(s) failed");
    }
    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.log_file {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    let destination = if cli.log_file {
        LogDestination::Both(PathBuf::from(LOG_FILE))
    } else {
        LogDestination::Terminal
    };
    clipper_logging::initialize(destination, level);
}

fn show(view: Option<AppViewModel>) {
    if let Some(view) = view {
        println!("{}", render::status_line(&view));
    }
}

/// Artifacts to fetch for a finished job.
fn artifact_targets(view: &AppViewModel, choice: DownloadChoice) -> Vec<ArtifactTarget> {
    let Some(job) = &view.job else {
        return Vec::new();
    };
    let units = || job.units().iter().map(|unit| ArtifactTarget::Unit(unit.index));
    let archive = job.archive_ref().map(|_| ArtifactTarget::Archive);
    match choice {
        DownloadChoice::All => units().chain(archive).collect(),
        DownloadChoice::Units => units().collect(),
        DownloadChoice::Archive if archive.is_some() => archive.into_iter().collect(),
        DownloadChoice::Archive => units().collect(),
        DownloadChoice::Skip => Vec::new(),
    }
}
