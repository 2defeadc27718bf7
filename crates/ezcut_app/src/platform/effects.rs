use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use ezcut_core::{Effect, JobStatus, Msg, PreviewProvider, ResourceTracker};
use ezcut_engine::{ClientError, JobPoller, JobTransport, PollSink};
use ezcut_logging::{ezcut_debug, ezcut_info, ezcut_warn};

/// Executes effects against the transport, the poller and the file tracker.
pub struct EffectRunner<T: JobTransport + ?Sized + 'static> {
    transport: Arc<T>,
    poller: JobPoller<T>,
}

impl<T: JobTransport + ?Sized + 'static> EffectRunner<T> {
    pub fn new(transport: Arc<T>, poller: JobPoller<T>) -> Self {
        Self { transport, poller }
    }

    pub fn poller(&mut self) -> &mut JobPoller<T> {
        &mut self.poller
    }

    /// Runs `effects` in order and returns the messages they produced.
    pub async fn run<P: PreviewProvider>(
        &mut self,
        effects: Vec<Effect>,
        tracker: &mut ResourceTracker<P>,
    ) -> Vec<Msg> {
        let mut follow_up = Vec::new();
        for effect in effects {
            match effect {
                Effect::SubmitBatch { files } => {
                    let media = tracker.media_for(&files);
                    ezcut_info!("SubmitBatch files={}", media.len());
                    let msg = match self.transport.submit_batch(&media).await {
                        Ok(response) => Msg::SubmitSucceeded {
                            job_id: response.job_id,
                        },
                        Err(err) => {
                            ezcut_warn!("Submission failed: {}", err);
                            Msg::SubmitFailed {
                                message: err.to_string(),
                            }
                        }
                    };
                    follow_up.push(msg);
                }
                Effect::StartPolling { job_id } => {
                    if let Err(err) = self.poller.start(&job_id) {
                        ezcut_warn!("Cannot poll job {}: {}", job_id, err);
                        follow_up.push(Msg::PollFailed {
                            job_id,
                            message: err.to_string(),
                            observed_at: Utc::now(),
                        });
                    }
                }
                Effect::StopPolling { job_id } => {
                    self.poller.stop(&job_id);
                }
                Effect::MarkFiles { status } => {
                    ezcut_debug!("MarkFiles status={:?} count={}", status, tracker.len());
                    tracker.mark_all(status);
                }
                Effect::ClearFiles => {
                    tracker.clear_all();
                }
            }
        }
        follow_up
    }
}

/// Turns poll callbacks into session messages.
#[derive(Debug, Default)]
pub struct MsgSink {
    inbox: VecDeque<Msg>,
}

impl MsgSink {
    pub fn pop(&mut self) -> Option<Msg> {
        self.inbox.pop_front()
    }

    pub fn push(&mut self, msg: Msg) {
        self.inbox.push_back(msg);
    }

    pub fn extend(&mut self, msgs: impl IntoIterator<Item = Msg>) {
        self.inbox.extend(msgs);
    }
}

impl PollSink for MsgSink {
    fn on_update(&mut self, status: &JobStatus) {
        self.inbox.push_back(Msg::StatusReceived {
            status: status.clone(),
            observed_at: Utc::now(),
        });
    }

    fn on_complete(&mut self, status: &JobStatus) {
        ezcut_info!("Job {} completed", status.job_id);
    }

    fn on_error(&mut self, job_id: &str, error: &ClientError) {
        self.inbox.push_back(Msg::PollFailed {
            job_id: job_id.to_string(),
            message: error.message.clone(),
            observed_at: error.at,
        });
    }
}
