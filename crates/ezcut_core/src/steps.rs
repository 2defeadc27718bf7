use chrono::{DateTime, Utc};

use crate::{JobId, JobStatus, ProcessingResult, StatusKind};

pub const UPLOAD_STEP: &str = "upload";
pub const VIDEO_STEP: &str = "video-processing";
pub const NARRATIVE_STEP: &str = "nlp-processing";
pub const ERROR_STEP: &str = "error";
pub const FALLBACK_STEP: &str = "processing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepState {
    #[default]
    Pending,
    Active,
    Done,
    Failed,
}

/// Stable id and display label for one pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDescriptor {
    pub id: &'static str,
    pub name: &'static str,
}

/// Maps a raw status onto its step. `Completed` shares the narrative step id.
pub fn step_for(kind: StatusKind) -> StepDescriptor {
    let (id, name) = match kind {
        StatusKind::Uploading => (UPLOAD_STEP, "Upload"),
        StatusKind::Processing => (VIDEO_STEP, "Video Processing"),
        StatusKind::GeneratingNarrative => (NARRATIVE_STEP, "Narrative Generation"),
        StatusKind::Completed => (NARRATIVE_STEP, "Completed"),
        StatusKind::Error => (ERROR_STEP, "Error"),
        StatusKind::Unknown => (FALLBACK_STEP, "Processing"),
    };
    StepDescriptor { id, name }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingStep {
    pub id: &'static str,
    pub name: &'static str,
    pub state: StepState,
    pub message: String,
    pub progress: u32,
    pub observed_at: DateTime<Utc>,
}

/// Merges one status update into the ordered step list.
///
/// Steps are keyed by the id from [`step_for`]: a known id is overwritten in
/// place, a new id is appended. An `error` status fails the most recent step
/// (or appends a synthetic error step to an empty list). Whenever a step is
/// active, every other active step is considered done.
pub fn reconcile(
    steps: &[ProcessingStep],
    status: &JobStatus,
    observed_at: DateTime<Utc>,
) -> Vec<ProcessingStep> {
    let mut next = steps.to_vec();
    let progress = status.progress.min(100);

    if status.status == StatusKind::Error {
        fail_last(&mut next, status.failure_message(), progress, observed_at);
        return next;
    }

    let descriptor = step_for(status.status);
    let state = if status.status == StatusKind::Completed {
        StepState::Done
    } else {
        StepState::Active
    };

    let current = match next.iter().position(|step| step.id == descriptor.id) {
        Some(index) => {
            let step = &mut next[index];
            step.name = descriptor.name;
            step.state = state;
            step.message = status.message.clone();
            step.progress = progress;
            step.observed_at = observed_at;
            index
        }
        None => {
            next.push(ProcessingStep {
                id: descriptor.id,
                name: descriptor.name,
                state,
                message: status.message.clone(),
                progress,
                observed_at,
            });
            next.len() - 1
        }
    };

    for (index, step) in next.iter_mut().enumerate() {
        if index != current && step.state == StepState::Active {
            step.state = StepState::Done;
        }
    }
    next
}

/// Marks the most recent step failed without removing anything.
pub fn mark_failed(
    steps: &[ProcessingStep],
    message: &str,
    observed_at: DateTime<Utc>,
) -> Vec<ProcessingStep> {
    let mut next = steps.to_vec();
    fail_last(&mut next, message.to_string(), 0, observed_at);
    next
}

fn fail_last(
    steps: &mut Vec<ProcessingStep>,
    message: String,
    progress: u32,
    observed_at: DateTime<Utc>,
) {
    match steps.last_mut() {
        Some(last) => {
            last.state = StepState::Failed;
            last.message = message;
            last.observed_at = observed_at;
        }
        None => {
            let descriptor = step_for(StatusKind::Error);
            steps.push(ProcessingStep {
                id: descriptor.id,
                name: descriptor.name,
                state: StepState::Failed,
                message,
                progress,
                observed_at,
            });
        }
    }
}

/// How a reconciler reacted to one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    Completed,
    Failed,
    /// Input arrived after a terminal state or belongs to another job.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed(ProcessingResult),
    Failed(String),
}

/// Step list and terminal outcome for a single job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepReconciler {
    job_id: Option<JobId>,
    steps: Vec<ProcessingStep>,
    outcome: Option<Outcome>,
}

impl StepReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_job(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: Some(job_id.into()),
            ..Self::default()
        }
    }

    pub fn apply(&mut self, status: &JobStatus, observed_at: DateTime<Utc>) -> Applied {
        if self.outcome.is_some() {
            return Applied::Ignored;
        }
        match &self.job_id {
            Some(job_id) if *job_id != status.job_id => return Applied::Ignored,
            Some(_) => {}
            None => self.job_id = Some(status.job_id.clone()),
        }

        self.steps = reconcile(&self.steps, status, observed_at);
        match status.status {
            StatusKind::Completed => {
                self.outcome = Some(Outcome::Completed(ProcessingResult::from_status(status)));
                Applied::Completed
            }
            StatusKind::Error => {
                self.outcome = Some(Outcome::Failed(status.failure_message()));
                Applied::Failed
            }
            _ => Applied::Updated,
        }
    }

    /// Records a failure that did not come from the pipeline itself.
    pub fn fail(&mut self, message: &str, observed_at: DateTime<Utc>) -> Applied {
        if self.outcome.is_some() {
            return Applied::Ignored;
        }
        self.steps = mark_failed(&self.steps, message, observed_at);
        self.outcome = Some(Outcome::Failed(message.to_string()));
        Applied::Failed
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn steps(&self) -> &[ProcessingStep] {
        &self.steps
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn result(&self) -> Option<&ProcessingResult> {
        match &self.outcome {
            Some(Outcome::Completed(result)) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Some(Outcome::Failed(message)) => Some(message),
            _ => None,
        }
    }

    /// Latest reported progress, taken from the most recently touched step.
    pub fn progress(&self) -> u32 {
        self.steps
            .iter()
            .max_by_key(|step| step.observed_at)
            .map_or(0, |step| step.progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_maps_to_a_known_step() {
        assert_eq!(step_for(StatusKind::Uploading).id, UPLOAD_STEP);
        assert_eq!(step_for(StatusKind::Processing).id, VIDEO_STEP);
        assert_eq!(step_for(StatusKind::GeneratingNarrative).id, NARRATIVE_STEP);
        assert_eq!(step_for(StatusKind::Completed).id, NARRATIVE_STEP);
        assert_eq!(step_for(StatusKind::Completed).name, "Completed");
        assert_eq!(step_for(StatusKind::Error).id, ERROR_STEP);
        assert_eq!(step_for(StatusKind::Unknown).id, FALLBACK_STEP);
    }

    #[test]
    fn mark_failed_on_empty_list_appends_error_step() {
        let steps = mark_failed(&[], "connection refused", Utc::now());
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id, ERROR_STEP);
        assert_eq!(steps[0].state, StepState::Failed);
        assert_eq!(steps[0].message, "connection refused");
    }
}
