use crate::{JobId, ProcessingResult, ProcessingStep, SessionPhase};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: SessionPhase,
    pub job_id: Option<JobId>,
    pub steps: Vec<ProcessingStep>,
    pub progress: u32,
    pub result: Option<ProcessingResult>,
    pub error: Option<String>,
    pub dirty: bool,
}
