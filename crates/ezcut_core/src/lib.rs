//! EzCut core: status model, step reconciliation, preview tracking and the
//! pure session state machine.
mod effect;
mod msg;
mod narrative;
mod result;
mod state;
mod status;
mod steps;
mod tracker;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use narrative::{format_narrative, parse_timestamp, timestamp_markers, TimestampMarker};
pub use result::{ProcessingResult, MAX_FILE_REFS};
pub use state::{AppState, SessionPhase};
pub use status::{
    CutsSummary, JobId, JobResult, JobStatus, JobSummary, StatusKind, DEFAULT_FAILURE_MESSAGE,
};
pub use steps::{
    mark_failed, reconcile, step_for, Applied, Outcome, ProcessingStep, StepDescriptor,
    StepReconciler, StepState, ERROR_STEP, FALLBACK_STEP, NARRATIVE_STEP, UPLOAD_STEP,
    VIDEO_STEP,
};
pub use tracker::{
    media_type, FileId, FileStatus, MediaFile, PreviewHandle, PreviewProvider, ResourceTracker,
    TrackedFile,
};
pub use update::{update, NO_FILES_MESSAGE, NO_JOB_MESSAGE};
pub use view_model::AppViewModel;
