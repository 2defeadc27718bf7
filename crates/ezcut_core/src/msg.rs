use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked to process the given files.
    SubmitClicked { files: Vec<crate::FileId> },
    /// Upload accepted; the remote job id is known.
    SubmitSucceeded { job_id: crate::JobId },
    /// Upload rejected or never reached the service.
    SubmitFailed { message: String },
    /// Follow a job that was started elsewhere.
    WatchRequested { job_id: crate::JobId },
    /// Poller delivered a status snapshot.
    StatusReceived {
        status: crate::JobStatus,
        observed_at: DateTime<Utc>,
    },
    /// Poller stopped on a transport failure.
    PollFailed {
        job_id: crate::JobId,
        message: String,
        observed_at: DateTime<Utc>,
    },
    /// User stopped watching the running job.
    CancelClicked,
    /// User cleared the batch.
    ClearAll,
    /// Fallback for placeholder wiring.
    NoOp,
}
