use ezcut_core::{
    AppViewModel, FileStatus, JobStatus, JobSummary, PreviewProvider, ProcessingResult,
    ProcessingStep, ResourceTracker, SessionPhase, StepState,
};

pub fn render_view(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    let job = view.job_id.as_deref().unwrap_or("-");
    lines.push(format!(
        "job {job} [{}] {}%",
        phase_label(view.phase),
        view.progress
    ));
    lines.extend(view.steps.iter().map(render_step));

    if let Some(error) = &view.error {
        lines.push(format!("error: {error}"));
    }
    if let Some(result) = &view.result {
        lines.extend(render_result(result));
    }
    lines
}

pub fn render_step(step: &ProcessingStep) -> String {
    let mut line = format!("  [{:<6}] {}", state_label(step.state), step.name);
    if !step.message.is_empty() {
        line.push_str(": ");
        line.push_str(&step.message);
    }
    if step.state == StepState::Active {
        line.push_str(&format!(" ({}%)", step.progress));
    }
    line
}

pub fn render_result(result: &ProcessingResult) -> Vec<String> {
    let mut lines = vec![result.message.clone()];
    if let Some(output_file) = &result.output_file {
        lines.push(format!("output: {output_file}"));
    }
    lines.extend(result.files.iter().map(|file| format!("  file: {file}")));
    if let Some(cuts) = &result.cuts {
        lines.push(format!(
            "final video: {} ({} intervals, {:.1}s, {} bytes)",
            cuts.final_video_path, cuts.intervals_count, cuts.total_duration, cuts.final_video_size
        ));
    }
    if !result.narrative.is_empty() {
        lines.push(String::new());
        lines.extend(result.narrative.lines().map(str::to_string));
    }
    lines
}

pub fn render_files<P: PreviewProvider>(tracker: &ResourceTracker<P>) -> Vec<String> {
    let active = tracker.active().map(|file| file.id);
    tracker
        .files()
        .iter()
        .map(|tracked| {
            let marker = if Some(tracked.id) == active { '*' } else { ' ' };
            format!(
                "{marker} {:>3} {:<10} {} ({} bytes) {}",
                tracked.id,
                file_status_label(tracked.status),
                tracked.file.name,
                tracked.file.size,
                tracked.preview().url()
            )
        })
        .collect()
}

pub fn render_status(status: &JobStatus) -> Vec<String> {
    let mut lines = vec![format!(
        "job {} [{:?}] {}%: {}",
        status.job_id, status.status, status.progress, status.message
    )];
    if let Some(error) = &status.error {
        lines.push(format!("error: {error}"));
    }
    if let Some(created_at) = &status.created_at {
        lines.push(format!("created: {created_at}"));
    }
    if let Some(completed_at) = &status.completed_at {
        lines.push(format!("completed: {completed_at}"));
    }
    lines
}

pub fn render_jobs(jobs: &[JobSummary]) -> Vec<String> {
    if jobs.is_empty() {
        return vec!["no jobs".to_string()];
    }
    jobs.iter()
        .map(|job| {
            format!(
                "{:<38} {:<22} {:>3}% {}",
                job.job_id,
                format!("{:?}", job.status),
                job.progress,
                job.created_at.as_deref().unwrap_or("-")
            )
        })
        .collect()
}

fn phase_label(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => "idle",
        SessionPhase::Submitting => "uploading",
        SessionPhase::Polling => "processing",
        SessionPhase::Completed => "completed",
        SessionPhase::Failed => "failed",
        SessionPhase::Cancelled => "cancelled",
    }
}

fn state_label(state: StepState) -> &'static str {
    match state {
        StepState::Pending => "wait",
        StepState::Active => "active",
        StepState::Done => "done",
        StepState::Failed => "failed",
    }
}

fn file_status_label(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Uploaded => "selected",
        FileStatus::Processing => "processing",
        FileStatus::Processed => "processed",
        FileStatus::Error => "failed",
    }
}
