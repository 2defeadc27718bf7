use crate::narrative::format_narrative;
use crate::{CutsSummary, JobStatus};

/// Upper bound on file references built from a reported `processed_files`.
pub const MAX_FILE_REFS: u32 = 1_000;

/// What a finished job hands back to the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessingResult {
    pub message: String,
    pub narrative: String,
    /// One reference per processed file reported by the pipeline.
    pub files: Vec<String>,
    pub output_file: Option<String>,
    pub cuts: Option<CutsSummary>,
}

impl ProcessingResult {
    /// Builds the result for a `completed` status.
    ///
    /// A missing `result` payload yields an empty result rather than an error.
    pub fn from_status(status: &JobStatus) -> Self {
        let Some(payload) = status.result.as_ref() else {
            return Self {
                message: completion_message(status, None),
                ..Self::default()
            };
        };

        let count = payload.processed_files.unwrap_or(0);
        let files = (1..=count.min(MAX_FILE_REFS))
            .map(|index| processed_file_ref(&status.job_id, index))
            .collect();
        let narrative = payload
            .narrative
            .as_deref()
            .map(format_narrative)
            .unwrap_or_default();

        Self {
            message: completion_message(status, Some(count).filter(|_| !narrative.is_empty())),
            narrative,
            files,
            output_file: payload.output_file.clone(),
            cuts: payload.cuts(),
        }
    }
}

fn processed_file_ref(job_id: &str, index: u32) -> String {
    format!("{job_id}/processed_{index:02}.txt")
}

fn completion_message(status: &JobStatus, narrated_files: Option<u32>) -> String {
    if let Some(count) = narrated_files {
        return format!(
            "Successfully processed {count} video file(s) and generated narrative script"
        );
    }
    if status.message.trim().is_empty() {
        "Processing completed".to_string()
    } else {
        status.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobResult, StatusKind};

    fn completed(result: Option<JobResult>) -> JobStatus {
        JobStatus {
            job_id: "job-7".into(),
            status: StatusKind::Completed,
            progress: 100,
            message: "Processing completed successfully!".into(),
            result,
            error: None,
            created_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn missing_payload_gives_empty_result() {
        let result = ProcessingResult::from_status(&completed(None));
        assert!(result.files.is_empty());
        assert!(result.narrative.is_empty());
        assert_eq!(result.message, "Processing completed successfully!");
    }

    #[test]
    fn file_references_follow_processed_count() {
        let result = ProcessingResult::from_status(&completed(Some(JobResult {
            narrative: Some("[00:00:00] Once.".into()),
            processed_files: Some(3),
            ..JobResult::default()
        })));
        assert_eq!(
            result.files,
            vec![
                "job-7/processed_01.txt",
                "job-7/processed_02.txt",
                "job-7/processed_03.txt",
            ]
        );
        assert!(result.message.contains("3 video file(s)"));
    }

    #[test]
    fn implausible_file_count_is_capped() {
        let result = ProcessingResult::from_status(&completed(Some(JobResult {
            processed_files: Some(4_000_000_000),
            ..JobResult::default()
        })));
        assert_eq!(result.files.len(), MAX_FILE_REFS as usize);
        assert_eq!(
            result.files.last().map(String::as_str),
            Some("job-7/processed_1000.txt")
        );
    }

    #[test]
    fn cuts_payload_is_summarised() {
        let result = ProcessingResult::from_status(&completed(Some(JobResult {
            final_video_path: Some("out/final.mp4".into()),
            intervals_count: Some(12),
            total_duration: Some(120.0),
            final_video_size: Some(4_194_304),
            ..JobResult::default()
        })));
        let cuts = result.cuts.expect("cuts summary");
        assert_eq!(cuts.intervals_count, 12);
        assert_eq!(cuts.final_video_path, "out/final.mp4");
        assert_eq!(result.message, "Processing completed successfully!");
    }
}
