use chrono::{DateTime, Utc};

use crate::view_model::AppViewModel;
use crate::{Applied, FileId, JobId, JobStatus, StepReconciler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    Cancelled,
}

impl SessionPhase {
    /// A submission or poll loop is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, SessionPhase::Submitting | SessionPhase::Polling)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    phase: SessionPhase,
    job_id: Option<JobId>,
    submitted: Vec<FileId>,
    reconciler: StepReconciler,
    error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            job_id: self.job_id.clone(),
            steps: self.reconciler.steps().to_vec(),
            progress: self.reconciler.progress(),
            result: self.reconciler.result().cloned(),
            error: self.error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn submitted(&self) -> &[FileId] {
        &self.submitted
    }

    /// Returns whether the view changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_current_job(&self, job_id: &str) -> bool {
        self.job_id.as_deref() == Some(job_id)
    }

    pub(crate) fn reject_submission(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.dirty = true;
    }

    pub(crate) fn begin_submission(&mut self, files: Vec<FileId>) {
        self.phase = SessionPhase::Submitting;
        self.job_id = None;
        self.submitted = files;
        self.reconciler = StepReconciler::new();
        self.error = None;
        self.dirty = true;
    }

    pub(crate) fn start_polling(&mut self, job_id: JobId) {
        self.phase = SessionPhase::Polling;
        self.reconciler = StepReconciler::for_job(job_id.clone());
        self.job_id = Some(job_id);
        self.dirty = true;
    }

    pub(crate) fn watch(&mut self, job_id: JobId) {
        self.submitted.clear();
        self.error = None;
        self.start_polling(job_id);
    }

    pub(crate) fn fail_submission(&mut self, message: String) {
        self.phase = SessionPhase::Failed;
        self.error = Some(message);
        self.dirty = true;
    }

    pub(crate) fn apply_status(&mut self, status: &JobStatus, observed_at: DateTime<Utc>) -> Applied {
        let applied = self.reconciler.apply(status, observed_at);
        self.settle(applied);
        applied
    }

    pub(crate) fn apply_poll_failure(&mut self, message: &str, observed_at: DateTime<Utc>) -> Applied {
        let applied = self.reconciler.fail(message, observed_at);
        self.settle(applied);
        applied
    }

    fn settle(&mut self, applied: Applied) {
        match applied {
            Applied::Updated => {}
            Applied::Completed => self.phase = SessionPhase::Completed,
            Applied::Failed => {
                self.phase = SessionPhase::Failed;
                self.error = self.reconciler.error().map(ToOwned::to_owned);
            }
            Applied::Ignored => return,
        }
        self.dirty = true;
    }

    /// Stops tracking the running job; the step list stays as last observed.
    pub(crate) fn cancel(&mut self) -> Option<JobId> {
        self.phase = SessionPhase::Cancelled;
        self.dirty = true;
        self.job_id.clone()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self {
            dirty: true,
            ..Self::default()
        };
    }
}
