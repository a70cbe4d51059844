//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::app::{AppContainer, DefaultAppContainer};
use crate::cli::args::{CleanArgs, PackageArgs, StatusArgs};
use crate::domain::model::{JobContext, JobStatus, PackReport, Stage};
use crate::error::PackError;
use crate::utils::path::PathUtils;
use crate::utils::Utils;

/// Execute the package command
pub async fn package(container: &DefaultAppContainer, args: PackageArgs) -> Result<PackReport> {
    let ctx = job_context(container, &args.input, args.job_id.as_deref())?;
    info!(
        job_id = %ctx.job_id(),
        input = %args.input.display(),
        "Starting package operation"
    );

    let report = container
        .package_interactor()
        .execute(&ctx)
        .await
        .with_context(|| {
            format!(
                "Packaging {} failed; working directory kept at {} (resume with --job-id {})",
                PathUtils::display_name(&args.input),
                ctx.working_dir().display(),
                ctx.job_id()
            )
        })?;

    println!("{}", render_report(&report));
    Ok(report)
}

/// Execute the status command
pub async fn status(container: &DefaultAppContainer, args: StatusArgs) -> Result<JobStatus> {
    let ctx = job_context(container, &args.input, Some(&args.job_id))?;
    let status = container
        .package_interactor()
        .inspect(&ctx)
        .await
        .context("Failed to inspect job")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("Failed to serialize job status")?
        );
    } else {
        println!("{}", render_status(&status));
    }
    Ok(status)
}

/// Execute the clean command
pub async fn clean(container: &DefaultAppContainer, args: CleanArgs) -> Result<bool> {
    let ctx = job_context(container, &args.input, Some(&args.job_id))?;
    let removed = container
        .package_interactor()
        .discard(&ctx)
        .await
        .context("Failed to discard job")?;

    if removed {
        println!("Removed {}", ctx.working_dir().display());
    } else {
        println!("Nothing to remove for job {}", ctx.job_id());
    }
    Ok(removed)
}

fn job_context(
    container: &DefaultAppContainer,
    input: &Path,
    job_id: Option<&str>,
) -> Result<JobContext, PackError> {
    container
        .context_for(input, job_id)
        .map_err(PackError::InvalidJob)
}

fn stage_list(stages: &[Stage]) -> String {
    if stages.is_empty() {
        return "-".to_string();
    }
    stages
        .iter()
        .map(Stage::name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_report(report: &PackReport) -> String {
    format!(
        "Packaged {}\n  job id:   {}\n  segments: {}\n  archived: {} files\n  executed: {}\n  skipped:  {}\n  elapsed:  {}",
        report.final_output.display(),
        report.job_id,
        report.segment_count,
        report.archive_entries.len(),
        stage_list(&report.executed),
        stage_list(&report.skipped),
        Utils::format_duration(report.elapsed)
    )
}

pub fn render_status(status: &JobStatus) -> String {
    let mut lines = vec![
        format!("Job {}", status.job_id),
        format!(
            "  working dir:  {} ({})",
            status.working_dir.display(),
            if status.working_dir_exists { "present" } else { "absent" }
        ),
        format!(
            "  final output: {} ({})",
            status.final_output.display(),
            if status.final_output_exists { "present" } else { "absent" }
        ),
    ];
    for checkpoint in &status.checkpoints {
        lines.push(format!(
            "  [{}] {:<22} {}",
            if checkpoint.present { "x" } else { " " },
            checkpoint.stage.name(),
            PathUtils::display_name(&checkpoint.artifact)
        ));
    }
    if status.is_complete() {
        lines.push("  complete".to_string());
    } else {
        lines.push(format!("  resumes at:   {}", status.resume_from));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CheckpointState, JobId};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_render_report_lists_stages() {
        let report = PackReport {
            job_id: JobId::parse("job1").unwrap(),
            final_output: PathBuf::from("/videos/clip.mp4.zip"),
            executed: vec![Stage::Init, Stage::Transcoded],
            skipped: vec![],
            archive_entries: vec!["0.ts".to_string(), "manifest.m3u8".to_string()],
            segment_count: 1,
            elapsed: Duration::from_secs(3),
        };
        let text = render_report(&report);
        assert!(text.contains("/videos/clip.mp4.zip"));
        assert!(text.contains("init, transcoded"));
        assert!(text.contains("skipped:  -"));
        assert!(text.contains("archived: 2 files"));
    }

    #[test]
    fn test_render_status_marks_missing_checkpoints() {
        let status = JobStatus {
            job_id: JobId::parse("job1").unwrap(),
            working_dir: PathBuf::from("/work/job1-clip.mp4"),
            working_dir_exists: true,
            final_output: PathBuf::from("/videos/clip.mp4.zip"),
            final_output_exists: false,
            checkpoints: vec![
                CheckpointState {
                    stage: Stage::KeyGenerated,
                    artifact: PathBuf::from("/work/job1-clip.mp4/enc.key"),
                    present: true,
                },
                CheckpointState {
                    stage: Stage::Transcoded,
                    artifact: PathBuf::from("/work/job1-clip.mp4/manifest.m3u8"),
                    present: false,
                },
            ],
            resume_from: Stage::Transcoded,
        };
        let text = render_status(&status);
        assert!(text.contains("[x] key_generated"));
        assert!(text.contains("[ ] transcoded"));
        assert!(text.contains("resumes at:   transcoded"));
    }
}
