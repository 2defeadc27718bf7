use std::error::Error as StdError;
use std::fmt;

use chrono::{DateTime, Utc};
use ezcut_core::{JobId, JobStatus, JobSummary};
use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any network call.
    Validation,
    /// No response: refused, unreachable, reset.
    Connectivity,
    /// No response within the operation's timeout class.
    Timeout,
    /// Response with a non-success status code.
    Remote { status: u16, body: String },
    /// Success status but the body could not be read.
    Decode,
    /// The pipeline itself reported `status: error`.
    Application,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation failed"),
            ErrorKind::Connectivity => write!(f, "connection failed"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Remote { status, .. } => write!(f, "http status {status}"),
            ErrorKind::Decode => write!(f, "invalid response body"),
            ErrorKind::Application => write!(f, "processing failed"),
        }
    }
}

/// Failure of one service operation, with the original cause kept as `source`.
#[derive(Debug, Error)]
#[error("{operation}: {message}")]
pub struct ClientError {
    pub operation: &'static str,
    pub kind: ErrorKind,
    pub message: String,
    pub at: DateTime<Utc>,
    #[source]
    source: Option<BoxError>,
}

impl ClientError {
    pub fn new(operation: &'static str, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            at: Utc::now(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(operation, ErrorKind::Validation, message)
    }

    /// The pipeline reported `status: error` for a job.
    pub fn application(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(operation, ErrorKind::Application, message)
    }

    /// Only failures without any response are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Connectivity | ErrorKind::Timeout)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::Remote { status, .. } => Some(status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    pub job_id: JobId,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status_endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobList {
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Bounds accepted by the cut-generation pipeline, in seconds.
pub const CUTS_DURATION_RANGE: std::ops::RangeInclusive<u32> = 10..=600;
pub const CUTS_INTERVAL_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutsRequest {
    pub narrative_text: String,
    pub duration: u32,
    pub interval_duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl CutsRequest {
    pub fn new(narrative_text: impl Into<String>) -> Self {
        Self {
            narrative_text: narrative_text.into(),
            duration: 120,
            interval_duration: 10,
            job_id: None,
        }
    }

    /// Checks the request locally; returns the trimmed request to send.
    pub fn validated(&self) -> Result<Self, ClientError> {
        const OPERATION: &str = "generate_cuts";
        let narrative_text = self.narrative_text.trim();
        if narrative_text.is_empty() {
            return Err(ClientError::validation(OPERATION, "narrative text is empty"));
        }
        if !CUTS_DURATION_RANGE.contains(&self.duration) {
            return Err(ClientError::validation(
                OPERATION,
                format!(
                    "duration {}s outside {}..={}s",
                    self.duration,
                    CUTS_DURATION_RANGE.start(),
                    CUTS_DURATION_RANGE.end()
                ),
            ));
        }
        if !CUTS_INTERVAL_RANGE.contains(&self.interval_duration)
            || self.interval_duration > self.duration
        {
            return Err(ClientError::validation(
                OPERATION,
                format!(
                    "interval {}s outside {}..={}s or longer than duration",
                    self.interval_duration,
                    CUTS_INTERVAL_RANGE.start(),
                    CUTS_INTERVAL_RANGE.end()
                ),
            ));
        }
        Ok(Self {
            narrative_text: narrative_text.to_string(),
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CutsResponse {
    pub job_id: JobId,
    #[serde(default)]
    pub message: Option<String>,
}

/// What the poller hands to its consumer.
#[derive(Debug)]
pub enum PollEvent {
    Update(JobStatus),
    Completed(JobStatus),
    Failed { job_id: JobId, error: ClientError },
}

impl PollEvent {
    pub fn job_id(&self) -> &str {
        match self {
            PollEvent::Update(status) | PollEvent::Completed(status) => &status.job_id,
            PollEvent::Failed { job_id, .. } => job_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollEvent::Update(_))
    }
}
