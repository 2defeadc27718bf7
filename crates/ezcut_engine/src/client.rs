use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use ezcut_core::{JobStatus, MediaFile};
use ezcut_logging::{ezcut_debug, ezcut_info, ezcut_warn};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;

use crate::{
    ClientError, ClientSettings, CutsRequest, CutsResponse, ErrorKind, HealthStatus, JobList,
    MessageResponse, UploadResponse,
};

/// Operations offered by the processing service.
#[async_trait::async_trait]
pub trait JobTransport: Send + Sync {
    async fn health_check(&self) -> Result<HealthStatus, ClientError>;

    /// Uploads every file in one multipart request and returns the new job.
    async fn submit_batch(&self, files: &[MediaFile]) -> Result<UploadResponse, ClientError>;

    /// Current status of a job. Safe to call repeatedly.
    async fn get_status(&self, job_id: &str) -> Result<JobStatus, ClientError>;

    async fn list_jobs(&self) -> Result<JobList, ClientError>;

    async fn delete_job(&self, job_id: &str) -> Result<MessageResponse, ClientError>;

    async fn clear_jobs(&self) -> Result<MessageResponse, ClientError>;

    /// Starts the cut-generation pipeline; poll the returned job like any other.
    async fn generate_cuts(&self, request: &CutsRequest) -> Result<CutsResponse, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| map_reqwest_error("configure", err))?;
        Ok(Self { settings, client })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<T, ClientError> {
        let request = request
            .timeout(timeout)
            .build()
            .map_err(|err| map_reqwest_error(operation, err))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        ezcut_debug!("{} request {} {}", operation, method, path);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| map_reqwest_error(operation, err))?;

        let status = response.status();
        ezcut_debug!("{} response {} {} -> {}", operation, method, path, status);
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    ezcut_warn!("{} could not read error body: {}", operation, err);
                    format!("<unreadable body: {err}>")
                }
            };
            ezcut_warn!("{} failed with {}: {}", operation, status, body);
            return Err(ClientError::new(
                operation,
                ErrorKind::Remote {
                    status: status.as_u16(),
                    body,
                },
                format!("http status {status}"),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| map_reqwest_error(operation, err))?;
        serde_json::from_slice(&bytes).map_err(|err| {
            ClientError::new(operation, ErrorKind::Decode, err.to_string()).with_source(err)
        })
    }
}

#[async_trait::async_trait]
impl JobTransport for ReqwestTransport {
    async fn health_check(&self) -> Result<HealthStatus, ClientError> {
        let request = self.client.get(self.settings.endpoint("/health"));
        self.send_json("health_check", request, self.settings.status_timeout)
            .await
    }

    async fn submit_batch(&self, files: &[MediaFile]) -> Result<UploadResponse, ClientError> {
        const OPERATION: &str = "submit_batch";
        if files.is_empty() {
            return Err(ClientError::validation(
                OPERATION,
                "at least one file is required",
            ));
        }

        let total: u64 = files.iter().map(|file| file.size).sum();
        let sent = Arc::new(AtomicU64::new(0));
        let mut form = Form::new();
        for file in files {
            form = form.part("files", file_part(file, sent.clone(), total).await?);
        }

        ezcut_info!("Uploading {} file(s), {} bytes", files.len(), total);
        let request = self
            .client
            .post(self.settings.endpoint("/upload-videos"))
            .multipart(form);
        let response: UploadResponse = self
            .send_json(OPERATION, request, self.settings.upload_timeout)
            .await?;
        ezcut_info!("Upload accepted, job_id={}", response.job_id);
        Ok(response)
    }

    async fn get_status(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        const OPERATION: &str = "get_status";
        require_job_id(OPERATION, job_id)?;
        let request = self
            .client
            .get(self.settings.endpoint(&format!("/job/{job_id}")));
        let status: JobStatus = self
            .send_json(OPERATION, request, self.settings.status_timeout)
            .await?;
        ezcut_debug!(
            "job_id={} status={:?} progress={} message={:?} error={:?}",
            status.job_id,
            status.status,
            status.progress,
            status.message,
            status.error
        );
        Ok(status)
    }

    async fn list_jobs(&self) -> Result<JobList, ClientError> {
        let request = self.client.get(self.settings.endpoint("/jobs"));
        let list: JobList = self
            .send_json("list_jobs", request, self.settings.admin_timeout)
            .await?;
        ezcut_debug!("Retrieved {} jobs", list.jobs.len());
        Ok(list)
    }

    async fn delete_job(&self, job_id: &str) -> Result<MessageResponse, ClientError> {
        const OPERATION: &str = "delete_job";
        require_job_id(OPERATION, job_id)?;
        let request = self
            .client
            .delete(self.settings.endpoint(&format!("/job/{job_id}")));
        self.send_json(OPERATION, request, self.settings.admin_timeout)
            .await
    }

    async fn clear_jobs(&self) -> Result<MessageResponse, ClientError> {
        let request = self.client.delete(self.settings.endpoint("/jobs"));
        self.send_json("clear_jobs", request, self.settings.admin_timeout)
            .await
    }

    async fn generate_cuts(&self, request: &CutsRequest) -> Result<CutsResponse, ClientError> {
        let body = request.validated()?;
        ezcut_info!(
            "Generating cuts: {} chars, duration={}s, interval={}s, job_id={:?}",
            body.narrative_text.len(),
            body.duration,
            body.interval_duration,
            body.job_id
        );
        let request = self
            .client
            .post(self.settings.endpoint("/generate-cuts"))
            .json(&body);
        self.send_json("generate_cuts", request, self.settings.admin_timeout)
            .await
    }
}

fn require_job_id(operation: &'static str, job_id: &str) -> Result<(), ClientError> {
    if job_id.trim().is_empty() || job_id.contains('/') {
        return Err(ClientError::validation(
            operation,
            format!("invalid job id {job_id:?}"),
        ));
    }
    Ok(())
}

/// Streams one file from disk into a multipart part, logging upload progress.
async fn file_part(
    file: &MediaFile,
    sent: Arc<AtomicU64>,
    total: u64,
) -> Result<Part, ClientError> {
    const OPERATION: &str = "submit_batch";
    let handle = tokio::fs::File::open(&file.path).await.map_err(|err| {
        ClientError::validation(
            OPERATION,
            format!("cannot open {}: {err}", file.path.display()),
        )
        .with_source(err)
    })?;
    let length = match handle.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(_) => file.size,
    };

    let name = file.name.clone();
    let stream = ReaderStream::new(handle).inspect(move |chunk| {
        if let Ok(bytes) = chunk {
            let chunk_len = bytes.len() as u64;
            let done = sent.fetch_add(chunk_len, Ordering::Relaxed) + chunk_len;
            ezcut_debug!("upload {} progress {}/{} bytes", name, done, total);
        }
    });

    let part = Part::stream_with_length(Body::wrap_stream(stream), length)
        .file_name(file.name.clone());
    match file.media_type() {
        Some(mime) => part
            .mime_str(mime)
            .map_err(|err| map_reqwest_error(OPERATION, err)),
        None => Ok(part),
    }
}

fn map_reqwest_error(operation: &'static str, err: reqwest::Error) -> ClientError {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_decode() {
        ErrorKind::Decode
    } else if err.is_builder() {
        ErrorKind::Validation
    } else {
        ErrorKind::Connectivity
    };
    ClientError::new(operation, kind, err.to_string()).with_source(err)
}
