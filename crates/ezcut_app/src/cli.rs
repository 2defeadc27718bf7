use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::platform::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "ezcut",
    about = "Batch client for the EzCut video processing service",
    version
)]
pub struct Cli {
    /// Settings file; ./ezcut.ron is used when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Service base URL, overriding the settings file
    #[arg(long, global = true, env = "EZCUT_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Where log output goes
    #[arg(long, global = true, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Command {
    /// Check that the service is reachable
    Health,
    /// Upload video files as one batch and follow processing
    Submit {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Follow an existing job until it finishes
    Watch { job_id: String },
    /// Show the current status of a job once
    Status { job_id: String },
    /// List jobs known to the service
    Jobs,
    /// Delete one job
    Delete { job_id: String },
    /// Delete every job
    Clear,
    /// Cut a final video from a timestamped narrative and follow the job
    Cuts {
        #[arg(long)]
        narrative_file: PathBuf,
        /// Target duration of the final video in seconds
        #[arg(long, default_value_t = 120)]
        duration: u32,
        /// Length of each cut in seconds
        #[arg(long, default_value_t = 10)]
        interval: u32,
        /// Job whose processed videos are cut
        #[arg(long)]
        job: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn submit_requires_files() {
        assert!(Cli::try_parse_from(["ezcut", "submit"]).is_err());
        let cli = Cli::try_parse_from(["ezcut", "submit", "a.mp4", "b.mov"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Submit {
                files: vec![PathBuf::from("a.mp4"), PathBuf::from("b.mov")]
            }
        );
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "ezcut",
            "watch",
            "job-1",
            "--base-url",
            "http://127.0.0.1:9000",
            "--log",
            "both",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(cli.log, LogDestination::Both);
        assert_eq!(
            cli.command,
            Command::Watch {
                job_id: "job-1".to_string()
            }
        );
    }

    #[test]
    fn cuts_defaults() {
        let cli =
            Cli::try_parse_from(["ezcut", "cuts", "--narrative-file", "story.txt"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Cuts {
                narrative_file: PathBuf::from("story.txt"),
                duration: 120,
                interval: 10,
                job: None,
            }
        );
    }
}
