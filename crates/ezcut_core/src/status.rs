use serde::{Deserialize, Serialize};

pub type JobId = String;

/// Coarse phase reported by the remote pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Uploading,
    Processing,
    GeneratingNarrative,
    Completed,
    Error,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl StatusKind {
    pub fn is_terminal(self) -> bool {
        matches!(self, StatusKind::Completed | StatusKind::Error)
    }
}

/// One status snapshot as returned by `GET /job/{job_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: JobId,
    pub status: StatusKind,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Failure text for an `error` status, falling back to the message.
    pub fn failure_message(&self) -> String {
        self.error
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| Some(self.message.as_str()).filter(|text| !text.trim().is_empty()))
            .unwrap_or(DEFAULT_FAILURE_MESSAGE)
            .to_string()
    }
}

pub const DEFAULT_FAILURE_MESSAGE: &str = "Processing failed";

/// Terminal payload of a completed job.
///
/// Narrative jobs fill the first three fields, cut-generation jobs the rest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub processed_files: Option<u32>,
    #[serde(default)]
    pub final_video_path: Option<String>,
    #[serde(default)]
    pub intervals_count: Option<u32>,
    #[serde(default)]
    pub total_duration: Option<f64>,
    #[serde(default)]
    pub final_video_size: Option<u64>,
}

impl JobResult {
    /// Summary of a cut-generation run, when this result came from one.
    pub fn cuts(&self) -> Option<CutsSummary> {
        let final_video_path = self.final_video_path.clone()?;
        Some(CutsSummary {
            final_video_path,
            intervals_count: self.intervals_count.unwrap_or(0),
            total_duration: self.total_duration.unwrap_or(0.0),
            final_video_size: self.final_video_size.unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CutsSummary {
    pub final_video_path: String,
    pub intervals_count: u32,
    pub total_duration: f64,
    pub final_video_size: u64,
}

/// Row of `GET /jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: StatusKind,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_string_is_not_an_error() {
        let status: StatusKind = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(status, StatusKind::Unknown);
    }

    #[test]
    fn failure_message_prefers_error_field() {
        let status = JobStatus {
            job_id: "j".into(),
            status: StatusKind::Error,
            progress: 5,
            message: "Error during processing: disk full".into(),
            result: None,
            error: Some("disk full".into()),
            created_at: None,
            completed_at: None,
        };
        assert_eq!(status.failure_message(), "disk full");

        let bare = JobStatus {
            error: None,
            message: String::new(),
            ..status
        };
        assert_eq!(bare.failure_message(), DEFAULT_FAILURE_MESSAGE);
    }
}
