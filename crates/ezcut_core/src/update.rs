use crate::{Applied, AppState, Effect, FileStatus, Msg, SessionPhase};

pub const NO_FILES_MESSAGE: &str = "At least one file is required";
pub const NO_JOB_MESSAGE: &str = "A job id is required";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitClicked { files } => {
            if state.phase().is_busy() {
                return (state, Vec::new());
            }
            if files.is_empty() {
                state.reject_submission(NO_FILES_MESSAGE);
                return (state, Vec::new());
            }
            state.begin_submission(files.clone());
            vec![
                Effect::MarkFiles {
                    status: FileStatus::Processing,
                },
                Effect::SubmitBatch { files },
            ]
        }
        Msg::SubmitSucceeded { job_id } => {
            // A cleared or cancelled batch no longer wants this job.
            if state.phase() != SessionPhase::Submitting {
                return (state, Vec::new());
            }
            state.start_polling(job_id.clone());
            vec![Effect::StartPolling { job_id }]
        }
        Msg::WatchRequested { job_id } => {
            if state.phase().is_busy() {
                return (state, Vec::new());
            }
            if job_id.trim().is_empty() {
                state.reject_submission(NO_JOB_MESSAGE);
                return (state, Vec::new());
            }
            state.watch(job_id.clone());
            vec![Effect::StartPolling { job_id }]
        }
        Msg::SubmitFailed { message } => {
            if state.phase() != SessionPhase::Submitting {
                return (state, Vec::new());
            }
            state.fail_submission(message);
            vec![Effect::MarkFiles {
                status: FileStatus::Error,
            }]
        }
        Msg::StatusReceived {
            status,
            observed_at,
        } => {
            if state.phase() != SessionPhase::Polling || !state.is_current_job(&status.job_id) {
                return (state, Vec::new());
            }
            match state.apply_status(&status, observed_at) {
                Applied::Completed => vec![Effect::MarkFiles {
                    status: FileStatus::Processed,
                }],
                Applied::Failed => vec![Effect::MarkFiles {
                    status: FileStatus::Error,
                }],
                Applied::Updated | Applied::Ignored => Vec::new(),
            }
        }
        Msg::PollFailed {
            job_id,
            message,
            observed_at,
        } => {
            if state.phase() != SessionPhase::Polling || !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            match state.apply_poll_failure(&message, observed_at) {
                Applied::Failed => vec![Effect::MarkFiles {
                    status: FileStatus::Error,
                }],
                _ => Vec::new(),
            }
        }
        Msg::CancelClicked => {
            if state.phase() != SessionPhase::Polling {
                return (state, Vec::new());
            }
            match state.cancel() {
                Some(job_id) => vec![
                    Effect::StopPolling { job_id },
                    Effect::MarkFiles {
                        status: FileStatus::Uploaded,
                    },
                ],
                None => Vec::new(),
            }
        }
        Msg::ClearAll => {
            let mut effects = Vec::with_capacity(2);
            if state.phase() == SessionPhase::Polling {
                if let Some(job_id) = state.job_id() {
                    effects.push(Effect::StopPolling {
                        job_id: job_id.to_string(),
                    });
                }
            }
            state.reset();
            effects.push(Effect::ClearFiles);
            effects
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
