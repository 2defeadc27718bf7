use std::io;

use ezcut_core::{update, AppState, AppViewModel, Msg, PreviewProvider, ResourceTracker};
use ezcut_engine::{dispatch, JobTransport, PollEvent};
use ezcut_logging::{ezcut_error, ezcut_warn};

use super::effects::{EffectRunner, MsgSink};
use super::render::render_view;

enum Wake {
    Event(Option<PollEvent>),
    Interrupted(io::Result<()>),
}

/// Drives one submission or watch from the first message to a settled phase.
pub struct Session<T: JobTransport + ?Sized + 'static, P: PreviewProvider> {
    state: AppState,
    tracker: ResourceTracker<P>,
    runner: EffectRunner<T>,
    inbox: MsgSink,
    rendered: Vec<String>,
}

impl<T: JobTransport + ?Sized + 'static, P: PreviewProvider> Session<T, P> {
    pub fn new(tracker: ResourceTracker<P>, runner: EffectRunner<T>) -> Self {
        Self {
            state: AppState::new(),
            tracker,
            runner,
            inbox: MsgSink::default(),
            rendered: Vec::new(),
        }
    }

    pub fn tracker(&self) -> &ResourceTracker<P> {
        &self.tracker
    }

    /// Processes `initial` and every follow-up until no job is being polled.
    /// Ctrl-C cancels the running job.
    pub async fn run(&mut self, initial: Msg) -> AppViewModel {
        self.inbox.push(initial);
        loop {
            while let Some(msg) = self.inbox.pop() {
                self.dispatch_msg(msg).await;
            }
            if !self.runner.poller().has_active() {
                break;
            }

            let wake = tokio::select! {
                event = self.runner.poller().next_event() => Wake::Event(event),
                signal = tokio::signal::ctrl_c() => Wake::Interrupted(signal),
            };
            match wake {
                Wake::Event(Some(event)) => dispatch(&event, &mut self.inbox),
                Wake::Event(None) => {}
                Wake::Interrupted(result) => {
                    if let Err(err) = result {
                        ezcut_error!("Failed to listen for Ctrl-C: {}", err);
                    }
                    ezcut_warn!("Interrupted; stopping");
                    self.inbox.push(Msg::CancelClicked);
                }
            }
        }
        self.state.view()
    }

    async fn dispatch_msg(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        if was_dirty {
            self.render();
        }
        let follow_up = self.runner.run(effects, &mut self.tracker).await;
        self.inbox.extend(follow_up);
    }

    fn render(&mut self) {
        let lines = render_view(&self.state.view());
        if lines == self.rendered {
            return;
        }
        for line in &lines {
            println!("{line}");
        }
        self.rendered = lines;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use ezcut_core::{
        FileStatus, JobResult, JobStatus, MediaFile, SessionPhase, StatusKind, StepState,
    };
    use ezcut_engine::{
        ClientError, CutsRequest, CutsResponse, ErrorKind, HealthStatus, JobList, JobPoller,
        MessageResponse, UploadResponse,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::platform::preview::FilePreviewProvider;

    struct FakeTransport {
        reject_upload: bool,
        statuses: Mutex<VecDeque<JobStatus>>,
    }

    fn status(kind: StatusKind, progress: u32) -> JobStatus {
        JobStatus {
            job_id: "job-1".to_string(),
            status: kind,
            progress,
            message: format!("{kind:?}"),
            result: None,
            error: None,
            created_at: None,
            completed_at: None,
        }
    }

    impl FakeTransport {
        fn new(reject_upload: bool, statuses: Vec<JobStatus>) -> Arc<Self> {
            Arc::new(Self {
                reject_upload,
                statuses: Mutex::new(statuses.into()),
            })
        }
    }

    #[async_trait::async_trait]
    impl JobTransport for FakeTransport {
        async fn health_check(&self) -> Result<HealthStatus, ClientError> {
            Err(ClientError::validation("health_check", "unused"))
        }

        async fn submit_batch(&self, files: &[MediaFile]) -> Result<UploadResponse, ClientError> {
            if self.reject_upload {
                return Err(ClientError::new(
                    "submit_batch",
                    ErrorKind::Remote {
                        status: 500,
                        body: "boom".to_string(),
                    },
                    "http status 500 Internal Server Error",
                ));
            }
            assert_eq!(files.len(), 1);
            Ok(UploadResponse {
                job_id: "job-1".to_string(),
                message: "accepted".to_string(),
                status_endpoint: None,
            })
        }

        async fn get_status(&self, _job_id: &str) -> Result<JobStatus, ClientError> {
            let next = self.statuses.lock().unwrap().pop_front();
            next.ok_or_else(|| {
                ClientError::new("get_status", ErrorKind::Connectivity, "script exhausted")
            })
        }

        async fn list_jobs(&self) -> Result<JobList, ClientError> {
            Err(ClientError::validation("list_jobs", "unused"))
        }

        async fn delete_job(&self, _job_id: &str) -> Result<MessageResponse, ClientError> {
            Err(ClientError::validation("delete_job", "unused"))
        }

        async fn clear_jobs(&self) -> Result<MessageResponse, ClientError> {
            Err(ClientError::validation("clear_jobs", "unused"))
        }

        async fn generate_cuts(
            &self,
            _request: &CutsRequest,
        ) -> Result<CutsResponse, ClientError> {
            Err(ClientError::validation("generate_cuts", "unused"))
        }
    }

    fn session_with_clip(
        dir: &tempfile::TempDir,
        transport: Arc<FakeTransport>,
    ) -> (Session<FakeTransport, FilePreviewProvider>, Vec<u64>) {
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"clip").unwrap();
        let mut tracker = ResourceTracker::new(FilePreviewProvider::default());
        let ids = tracker.add_files([MediaFile::new(&path, 4)]);
        let poller = JobPoller::new(transport.clone(), Duration::from_millis(5));
        (Session::new(tracker, EffectRunner::new(transport, poller)), ids)
    }

    #[tokio::test]
    async fn submission_runs_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new(
            false,
            vec![
                status(StatusKind::Uploading, 10),
                status(StatusKind::Processing, 40),
                JobStatus {
                    result: Some(JobResult {
                        narrative: Some("[00:00:00] Hello".to_string()),
                        processed_files: Some(1),
                        ..JobResult::default()
                    }),
                    ..status(StatusKind::Completed, 100)
                },
            ],
        );
        let (mut session, ids) = session_with_clip(&dir, transport);

        let view = session.run(Msg::SubmitClicked { files: ids }).await;

        assert_eq!(view.phase, SessionPhase::Completed);
        assert_eq!(view.steps.len(), 3);
        assert!(view.steps.iter().all(|step| step.state == StepState::Done));
        let result = view.result.expect("result");
        assert_eq!(result.files, vec!["job-1/processed_01.txt".to_string()]);
        assert!(session
            .tracker()
            .files()
            .iter()
            .all(|file| file.status == FileStatus::Processed));
    }

    #[tokio::test]
    async fn rejected_upload_fails_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new(true, Vec::new());
        let (mut session, ids) = session_with_clip(&dir, transport);

        let view = session.run(Msg::SubmitClicked { files: ids }).await;

        assert_eq!(view.phase, SessionPhase::Failed);
        assert_eq!(
            view.error.as_deref(),
            Some("submit_batch: http status 500 Internal Server Error")
        );
        assert!(session
            .tracker()
            .files()
            .iter()
            .all(|file| file.status == FileStatus::Error));
    }

    #[tokio::test]
    async fn lost_connection_fails_the_running_step() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new(false, vec![status(StatusKind::Processing, 40)]);
        let (mut session, ids) = session_with_clip(&dir, transport);

        let view = session.run(Msg::SubmitClicked { files: ids }).await;

        assert_eq!(view.phase, SessionPhase::Failed);
        assert_eq!(view.steps.len(), 1);
        assert_eq!(view.steps[0].state, StepState::Failed);
        assert_eq!(view.steps[0].message, "script exhausted");
    }
}
