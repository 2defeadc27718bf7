use crate::{FileId, FileStatus, JobId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitBatch { files: Vec<FileId> },
    StartPolling { job_id: JobId },
    StopPolling { job_id: JobId },
    MarkFiles { status: FileStatus },
    ClearFiles,
}
