pub mod effects;
pub mod logging;
pub mod preview;
pub mod render;
pub mod session;
pub mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use ezcut_core::{media_type, AppViewModel, MediaFile, Msg, ResourceTracker, SessionPhase};
use ezcut_engine::{CutsRequest, JobPoller, JobTransport, ReqwestTransport};
use ezcut_logging::{ezcut_debug, ezcut_info, parse_level};

use crate::cli::{Cli, Command};
use effects::EffectRunner;
use preview::FilePreviewProvider;
use render::{render_files, render_jobs, render_status};
use session::Session;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let (settings, source) =
        settings::load(cli.config.as_deref()).context("failed to load settings")?;
    logging::initialize(cli.log, parse_level(&settings.log_level));
    ezcut_info!("Settings loaded from {:?}", source);

    let client = settings
        .client_settings(cli.base_url.as_deref())
        .context("invalid settings")?;
    ezcut_info!("Using service at {}", client.base_url);
    let poll_interval = client.poll_interval;
    let transport = Arc::new(ReqwestTransport::new(client)?);

    match cli.command {
        Command::Health => {
            let health = transport.health_check().await?;
            println!(
                "{} {}",
                health.status,
                health.timestamp.unwrap_or_default()
            );
        }
        Command::Submit { files } => {
            let media = collect_media(&files)?;
            let mut tracker = ResourceTracker::new(FilePreviewProvider::default());
            let ids = tracker.add_files(media);
            if ids.is_empty() {
                bail!("none of the given files can be read");
            }
            for line in render_files(&tracker) {
                println!("{line}");
            }
            let view = follow(transport, poll_interval, tracker, Msg::SubmitClicked { files: ids })
                .await;
            settle(view)?;
        }
        Command::Watch { job_id } => {
            let tracker = ResourceTracker::new(FilePreviewProvider::default());
            let view = follow(transport, poll_interval, tracker, Msg::WatchRequested { job_id })
                .await;
            settle(view)?;
        }
        Command::Status { job_id } => {
            let status = transport.get_status(&job_id).await?;
            for line in render_status(&status) {
                println!("{line}");
            }
        }
        Command::Jobs => {
            let list = transport.list_jobs().await?;
            for line in render_jobs(&list.jobs) {
                println!("{line}");
            }
        }
        Command::Delete { job_id } => {
            let response = transport.delete_job(&job_id).await?;
            println!("{}", response.message);
        }
        Command::Clear => {
            let response = transport.clear_jobs().await?;
            println!("{}", response.message);
        }
        Command::Cuts {
            narrative_file,
            duration,
            interval,
            job,
        } => {
            let narrative = tokio::fs::read_to_string(&narrative_file)
                .await
                .with_context(|| format!("cannot read {}", narrative_file.display()))?;
            let mut request = CutsRequest::new(narrative);
            request.duration = duration;
            request.interval_duration = interval;
            request.job_id = job;

            let response = transport.generate_cuts(&request).await?;
            println!("cut generation started as job {}", response.job_id);
            let tracker = ResourceTracker::new(FilePreviewProvider::default());
            let view = follow(
                transport,
                poll_interval,
                tracker,
                Msg::WatchRequested {
                    job_id: response.job_id,
                },
            )
            .await;
            settle(view)?;
        }
    }
    Ok(())
}

async fn follow<T: JobTransport + 'static>(
    transport: Arc<T>,
    poll_interval: Duration,
    tracker: ResourceTracker<FilePreviewProvider>,
    initial: Msg,
) -> AppViewModel {
    let poller = JobPoller::new(transport.clone(), poll_interval);
    let mut session = Session::new(tracker, EffectRunner::new(transport, poller));
    let view = session.run(initial).await;

    let tracker = session.tracker();
    if !tracker.is_empty() {
        for line in render_files(tracker) {
            println!("{line}");
        }
    }
    ezcut_debug!("{} previews open at session end", tracker.provider().live());
    view
}

fn settle(view: AppViewModel) -> anyhow::Result<()> {
    match view.phase {
        SessionPhase::Failed => bail!(
            "{}",
            view.error.unwrap_or_else(|| "processing failed".to_string())
        ),
        SessionPhase::Cancelled => {
            println!(
                "stopped watching job {}",
                view.job_id.as_deref().unwrap_or("-")
            );
            Ok(())
        }
        _ => Ok(()),
    }
}

fn collect_media(paths: &[PathBuf]) -> anyhow::Result<Vec<MediaFile>> {
    paths
        .iter()
        .map(|path| {
            let metadata = std::fs::metadata(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            if !metadata.is_file() {
                bail!("{} is not a file", path.display());
            }
            if media_type(path).is_none() {
                bail!("unsupported file type: {}", path.display());
            }
            Ok(MediaFile::new(path, metadata.len()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_media_rejects_unsupported_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.webm");
        let notes = dir.path().join("notes.txt");
        std::fs::write(&clip, b"12345").unwrap();
        std::fs::write(&notes, b"text").unwrap();

        let media = collect_media(&[clip.clone()]).unwrap();
        assert_eq!(media[0].size, 5);
        assert_eq!(media[0].media_type(), Some("video/webm"));

        assert!(collect_media(&[clip.clone(), notes]).is_err());
        assert!(collect_media(&[dir.path().join("missing.mp4")]).is_err());
    }

    #[test]
    fn failed_view_becomes_an_error() {
        let view = AppViewModel {
            phase: SessionPhase::Failed,
            error: Some("disk full".to_string()),
            ..AppViewModel::default()
        };
        assert_eq!(settle(view).unwrap_err().to_string(), "disk full");
        assert!(settle(AppViewModel::default()).is_ok());
    }
}
