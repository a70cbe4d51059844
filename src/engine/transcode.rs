//! Transcoder invocation
//!
//! The engine is a black box. This module owns the command line and the
//! interpretation of its exit status, nothing about transcoding itself.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::JobContext;
use crate::domain::rules::JobRules;
use crate::engine::{StageCheckpointer, StageOutcome};
use crate::ports::{FsPort, ProcessPort, ProcessSpec};
use crate::utils::Utils;

/// Lines of transcoder stderr carried in a failure
const STDERR_TAIL_LINES: usize = 8;

/// Drives one transcoder run per job
pub struct TranscodeInvoker {
    fs: Arc<dyn FsPort>,
    process: Arc<dyn ProcessPort>,
    checkpointer: Arc<StageCheckpointer>,
    program: PathBuf,
    segment_duration: u32,
    timeout: Option<Duration>,
}

impl TranscodeInvoker {
    pub fn new(
        fs: Arc<dyn FsPort>,
        process: Arc<dyn ProcessPort>,
        checkpointer: Arc<StageCheckpointer>,
        program: impl Into<PathBuf>,
        segment_duration: u32,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            fs,
            process,
            checkpointer,
            program: program.into(),
            segment_duration,
            timeout,
        }
    }

    /// Build the transcoder command for `ctx`.
    ///
    /// The playlist goes to a partial path; it is renamed to the manifest
    /// only after a successful exit.
    pub fn build_invocation(&self, ctx: &JobContext) -> ProcessSpec {
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            ctx.staged_source().into_os_string(),
            "-hls_time".into(),
            self.segment_duration.to_string().into(),
            "-hls_key_info_file".into(),
            ctx.key_descriptor().into_os_string(),
            "-hls_playlist_type".into(),
            "vod".into(),
            "-hls_segment_filename".into(),
            ctx.segment_pattern().into(),
            "-f".into(),
            "hls".into(),
            ctx.partial_manifest().into_os_string(),
        ];

        ProcessSpec {
            program: self.program.clone(),
            args,
            working_dir: Some(ctx.working_dir().to_path_buf()),
            timeout: self.timeout,
        }
    }

    /// Run the transcoder unless the manifest already exists.
    ///
    /// Segments are not re-verified when the manifest is present.
    pub async fn transcode(&self, ctx: &JobContext) -> Result<StageOutcome, DomainError> {
        let manifest = ctx.manifest();
        if self.checkpointer.is_done(&manifest).await? {
            return Ok(StageOutcome::Skipped);
        }

        // Output of an interrupted earlier run is never trusted.
        self.discard_partial_output(ctx).await?;

        let spec = self.build_invocation(ctx);
        info!(
            job_id = %ctx.job_id(),
            program = %spec.program.display(),
            segment_duration = self.segment_duration,
            "Starting transcoder, this can take a while"
        );

        let result = match self.process.run(&spec).await {
            Ok(output) if output.success => {
                info!(
                    job_id = %ctx.job_id(),
                    elapsed = %Utils::format_duration(output.elapsed),
                    "Transcoder finished"
                );
                self.commit_manifest(ctx).await
            }
            Ok(output) => {
                let code = output
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                Err(DomainError::Process(format!(
                    "{} exited with status {}: {}",
                    spec.program.display(),
                    code,
                    Utils::tail_lines(&output.stderr, STDERR_TAIL_LINES)
                )))
            }
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            if let Err(cleanup) = self.discard_partial_output(ctx).await {
                warn!(job_id = %ctx.job_id(), error = %cleanup, "Could not discard partial transcoder output");
            }
            return Err(e);
        }
        Ok(StageOutcome::Produced)
    }

    /// Number of segment files currently in the working directory
    pub async fn count_segments(&self, ctx: &JobContext) -> Result<usize, DomainError> {
        let files = self.fs.list_files(ctx.working_dir()).await?;
        Ok(files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .filter(|n| JobRules::is_segment_file_name(n))
            .count())
    }

    async fn commit_manifest(&self, ctx: &JobContext) -> Result<(), DomainError> {
        let partial = ctx.partial_manifest();
        if !self.fs.file_exists(&partial).await? {
            return Err(DomainError::Process(
                "Transcoder exited successfully but wrote no playlist".to_string(),
            ));
        }
        self.fs.rename_file(&partial, &ctx.manifest()).await
    }

    /// Remove the partial playlist and every segment file
    async fn discard_partial_output(&self, ctx: &JobContext) -> Result<(), DomainError> {
        let partial = ctx.partial_manifest();
        for path in self.fs.list_files(ctx.working_dir()).await? {
            let is_output = path == partial
                || path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(JobRules::is_segment_file_name);
            if is_output {
                self.fs.delete_file(&path).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalFsAdapter;
    use crate::domain::errors::ErrorKind;
    use crate::domain::model::JobId;
    use crate::ports::ProcessOutput;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Writes segments and the playlist named on the command line, then exits with `exit_code`
    struct ScriptedEngine {
        exit_code: i32,
        write_playlist: bool,
    }

    #[async_trait]
    impl ProcessPort for ScriptedEngine {
        async fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput, DomainError> {
            let playlist = PathBuf::from(spec.args.last().unwrap());
            let dir = playlist.parent().unwrap();
            std::fs::write(dir.join("0.ts"), b"segment").unwrap();
            if self.write_playlist {
                std::fs::write(&playlist, "#EXTM3U\n0.ts\n").unwrap();
            }
            Ok(ProcessOutput {
                exit_code: Some(self.exit_code),
                success: self.exit_code == 0,
                stdout: String::new(),
                stderr: "line one\nConversion failed!\n".to_string(),
                elapsed: Duration::from_millis(5),
            })
        }
    }

    fn setup(engine: ScriptedEngine) -> (TempDir, JobContext, TranscodeInvoker) {
        let root = TempDir::new().unwrap();
        let ctx = JobContext::new("/videos/clip.mp4", JobId::generate(), root.path()).unwrap();
        std::fs::create_dir_all(ctx.working_dir()).unwrap();
        let fs: Arc<dyn FsPort> = Arc::new(LocalFsAdapter::new().unwrap());
        let checkpointer = Arc::new(StageCheckpointer::new(Arc::clone(&fs)));
        let invoker = TranscodeInvoker::new(fs, Arc::new(engine), checkpointer, "ffmpeg", 9, None);
        (root, ctx, invoker)
    }

    #[test]
    fn test_invocation_uses_fixed_configuration() {
        let (_root, ctx, invoker) = setup(ScriptedEngine { exit_code: 0, write_playlist: true });
        let spec = invoker.build_invocation(&ctx);
        let args: Vec<String> = spec
            .args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        let value_of = |flag: &str| {
            let index = args.iter().position(|a| a == flag).unwrap();
            args[index + 1].clone()
        };
        assert_eq!(value_of("-i"), ctx.staged_source().display().to_string());
        assert_eq!(value_of("-hls_time"), "9");
        assert_eq!(value_of("-hls_key_info_file"), ctx.key_descriptor().display().to_string());
        assert_eq!(value_of("-hls_playlist_type"), "vod");
        assert_eq!(value_of("-hls_segment_filename"), "%d.ts");
        assert_eq!(args.last().unwrap(), &ctx.partial_manifest().display().to_string());
        assert_eq!(spec.program, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_percent_in_file_name_stays_out_of_segment_pattern() {
        let (root, _, invoker) = setup(ScriptedEngine { exit_code: 0, write_playlist: true });
        for source in ["/videos/50%off.mp4", "/videos/clip%d.mp4"] {
            let ctx = JobContext::new(source, JobId::generate(), root.path()).unwrap();
            let spec = invoker.build_invocation(&ctx);
            let index = spec
                .args
                .iter()
                .position(|a| a == "-hls_segment_filename")
                .unwrap();
            let pattern = spec.args[index + 1].to_string_lossy().to_string();
            assert_eq!(pattern.matches('%').count(), 1, "{}", pattern);
            assert_eq!(spec.working_dir.as_deref(), Some(ctx.working_dir()));
        }
    }

    #[tokio::test]
    async fn test_success_commits_manifest() {
        let (_root, ctx, invoker) = setup(ScriptedEngine { exit_code: 0, write_playlist: true });
        assert_eq!(invoker.transcode(&ctx).await.unwrap(), StageOutcome::Produced);
        assert!(ctx.manifest().exists());
        assert!(!ctx.partial_manifest().exists());
        assert_eq!(invoker.count_segments(&ctx).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_nonzero_exit_discards_output() {
        let (_root, ctx, invoker) = setup(ScriptedEngine { exit_code: 1, write_playlist: true });
        let err = invoker.transcode(&ctx).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ProcessError);
        assert!(err.to_string().contains("Conversion failed!"));
        assert!(!ctx.manifest().exists());
        assert!(!ctx.partial_manifest().exists());
        assert_eq!(invoker.count_segments(&ctx).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_success_without_playlist_is_failure() {
        let (_root, ctx, invoker) = setup(ScriptedEngine { exit_code: 0, write_playlist: false });
        let err = invoker.transcode(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessError);
        assert_eq!(invoker.count_segments(&ctx).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_existing_manifest_skips_engine() {
        let (_root, ctx, invoker) = setup(ScriptedEngine { exit_code: 1, write_playlist: false });
        std::fs::write(ctx.manifest(), "#EXTM3U\n").unwrap();
        assert_eq!(invoker.transcode(&ctx).await.unwrap(), StageOutcome::Skipped);
    }
}
