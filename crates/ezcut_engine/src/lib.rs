//! EzCut engine: HTTP transport to the processing service and job polling.
mod client;
mod poller;
mod settings;
mod types;

pub use client::{JobTransport, ReqwestTransport};
pub use poller::{dispatch, JobPoller, PollError, PollSink};
pub use settings::{
    parse_base_url, ClientSettings, DEFAULT_ADMIN_TIMEOUT, DEFAULT_BASE_URL,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_STATUS_TIMEOUT,
    DEFAULT_UPLOAD_TIMEOUT,
};
pub use types::{
    ClientError, CutsRequest, CutsResponse, ErrorKind, HealthStatus, JobList, MessageResponse,
    PollEvent, UploadResponse, CUTS_DURATION_RANGE, CUTS_INTERVAL_RANGE,
};
