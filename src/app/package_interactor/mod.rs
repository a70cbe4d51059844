// Package interactor - Orchestrates the checkpointed packaging pipeline

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::JobRules;
use crate::engine::*;
use crate::error::{PackError, PackResult};
use crate::ports::*;

/// Stages executed and skipped during one run
#[derive(Debug, Default)]
struct RunLog {
    executed: Vec<Stage>,
    skipped: Vec<Stage>,
}

/// Interactor for the packaging use case
///
/// Drives `INIT → SOURCE_STAGED → KEY_GENERATED → DESCRIPTOR_GENERATED →
/// TRANSCODED → STATUS_WRITTEN → PACKAGED → FINALIZED → CLEANED` in order.
/// A failing stage halts the run and leaves the working directory untouched,
/// so the next run with the same job id resumes at the first missing artifact.
pub struct PackageInteractor {
    fs: Arc<dyn FsPort>,
    events: Arc<dyn EventSink>,
    checkpointer: Arc<StageCheckpointer>,
    keys: KeyMaterialGenerator,
    transcoder: TranscodeInvoker,
    packager: ArchivePackager,
    finalizer: Finalizer,
}

impl PackageInteractor {
    /// Create new package interactor with injected ports
    pub fn new(
        settings: &PipelineSettings,
        fs: Arc<dyn FsPort>,
        random: Arc<dyn RandomPort>,
        process: Arc<dyn ProcessPort>,
        archive: Arc<dyn ArchivePort>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let checkpointer = Arc::new(StageCheckpointer::new(Arc::clone(&fs)));
        let keys = KeyMaterialGenerator::new(
            Arc::clone(&fs),
            random,
            Arc::clone(&checkpointer),
            settings.key_uri.clone(),
        );
        let transcoder = TranscodeInvoker::new(
            Arc::clone(&fs),
            process,
            Arc::clone(&checkpointer),
            settings.ffmpeg_path.clone(),
            settings.segment_duration,
            settings.timeout,
        );
        let packager = ArchivePackager::new(Arc::clone(&fs), archive, Arc::clone(&checkpointer));
        let finalizer = Finalizer::new(Arc::clone(&fs));

        Self {
            fs,
            events,
            checkpointer,
            keys,
            transcoder,
            packager,
            finalizer,
        }
    }

    /// Run the whole pipeline for `ctx`
    pub async fn execute(&self, ctx: &JobContext) -> PackResult<PackReport> {
        let started = Instant::now();
        let mut log = RunLog::default();
        info!(
            job_id = %ctx.job_id(),
            source = %ctx.source().display(),
            working_dir = %ctx.working_dir().display(),
            "Starting packaging job"
        );

        self.run_unconditional(ctx, Stage::Init, &mut log, self.prepare_working_dir(ctx))
            .await?;
        self.run_checkpointed(ctx, Stage::SourceStaged, &mut log, self.stage_source(ctx))
            .await?;
        self.run_checkpointed(ctx, Stage::KeyGenerated, &mut log, self.keys.generate_key(ctx))
            .await?;
        self.run_checkpointed(
            ctx,
            Stage::DescriptorGenerated,
            &mut log,
            self.keys.generate_key_descriptor(ctx),
        )
        .await?;
        self.run_checkpointed(ctx, Stage::Transcoded, &mut log, self.transcoder.transcode(ctx))
            .await?;
        self.run_checkpointed(ctx, Stage::StatusWritten, &mut log, self.write_status_marker(ctx))
            .await?;

        let segment_count = self
            .transcoder
            .count_segments(ctx)
            .await
            .map_err(|e| PackError::stage(Stage::Packaged, e))?;
        let mut archive_entries = Vec::new();
        let packaging = async {
            let (outcome, entries) = self.packager.package(ctx).await?;
            archive_entries = entries;
            Ok::<_, DomainError>(outcome)
        };
        self.run_checkpointed(ctx, Stage::Packaged, &mut log, packaging)
            .await?;

        let mut final_output = ctx.final_output();
        let publishing = async {
            final_output = self.finalizer.publish(ctx).await?;
            Ok::<_, DomainError>(StageOutcome::Produced)
        };
        self.run_unconditional(ctx, Stage::Finalized, &mut log, publishing)
            .await?;
        self.run_unconditional(ctx, Stage::Cleaned, &mut log, async {
            self.finalizer.clean(ctx).await?;
            Ok::<_, DomainError>(StageOutcome::Produced)
        })
        .await?;

        let elapsed = started.elapsed();
        info!(
            job_id = %ctx.job_id(),
            output = %final_output.display(),
            executed = log.executed.len(),
            skipped = log.skipped.len(),
            "Packaging job finished"
        );

        Ok(PackReport {
            job_id: ctx.job_id().clone(),
            final_output,
            executed: log.executed,
            skipped: log.skipped,
            archive_entries,
            segment_count,
            elapsed,
        })
    }

    /// Describe the on-disk state of a job without changing it
    pub async fn inspect(&self, ctx: &JobContext) -> Result<JobStatus, DomainError> {
        let working_dir_exists = self.fs.directory_exists(ctx.working_dir()).await?;
        let final_output = ctx.final_output();
        let final_output_exists = self.fs.file_exists(&final_output).await?;

        let mut checkpoints = Vec::with_capacity(Stage::CHECKPOINTED.len());
        let mut resume_from = None;
        for stage in Stage::CHECKPOINTED {
            let Some(artifact) = ctx.checkpoint_artifact(stage) else {
                continue;
            };
            let present = working_dir_exists && self.checkpointer.is_done(&artifact).await?;
            if !present && resume_from.is_none() {
                resume_from = Some(stage);
            }
            checkpoints.push(CheckpointState {
                stage,
                artifact,
                present,
            });
        }

        Ok(JobStatus {
            job_id: ctx.job_id().clone(),
            working_dir: ctx.working_dir().to_path_buf(),
            working_dir_exists,
            final_output,
            final_output_exists,
            checkpoints,
            resume_from: resume_from.unwrap_or(Stage::Finalized),
        })
    }

    /// Remove a job's working directory. Returns false if there was none.
    pub async fn discard(&self, ctx: &JobContext) -> Result<bool, DomainError> {
        if !self.fs.directory_exists(ctx.working_dir()).await? {
            return Ok(false);
        }
        self.fs.delete_directory(ctx.working_dir()).await?;
        info!(job_id = %ctx.job_id(), path = %ctx.working_dir().display(), "Job discarded");
        Ok(true)
    }

    /// Run a stage gated by its checkpoint artifact
    async fn run_checkpointed<F>(
        &self,
        ctx: &JobContext,
        stage: Stage,
        log: &mut RunLog,
        work: F,
    ) -> PackResult<()>
    where
        F: Future<Output = Result<StageOutcome, DomainError>>,
    {
        let done = self
            .checkpointer
            .is_stage_done(ctx, stage)
            .await
            .map_err(|e| PackError::stage(stage, e))?;
        if done {
            self.emit_skipped(ctx, stage, log).await;
            return Ok(());
        }
        self.run_unconditional(ctx, stage, log, work).await
    }

    /// Run a stage and report its outcome
    async fn run_unconditional<F>(
        &self,
        ctx: &JobContext,
        stage: Stage,
        log: &mut RunLog,
        work: F,
    ) -> PackResult<()>
    where
        F: Future<Output = Result<StageOutcome, DomainError>>,
    {
        self.events
            .emit(&StageEvent::new(ctx.job_id(), stage, StageStatus::Started))
            .await;

        match work.await {
            Ok(StageOutcome::Produced) => {
                log.executed.push(stage);
                let mut event = StageEvent::new(ctx.job_id(), stage, StageStatus::Completed);
                if let Some(artifact) = ctx.checkpoint_artifact(stage) {
                    event = event.with_detail(artifact.display().to_string());
                }
                self.events.emit(&event).await;
                Ok(())
            }
            Ok(StageOutcome::Skipped) => {
                self.emit_skipped(ctx, stage, log).await;
                Ok(())
            }
            Err(e) => {
                warn!(
                    job_id = %ctx.job_id(),
                    stage = %stage,
                    kind = %e.kind(),
                    working_dir = %ctx.working_dir().display(),
                    "Stage failed, working directory kept for resumption"
                );
                self.events
                    .emit(
                        &StageEvent::new(ctx.job_id(), stage, StageStatus::Failed)
                            .with_error(e.to_string()),
                    )
                    .await;
                Err(PackError::stage(stage, e))
            }
        }
    }

    async fn emit_skipped(&self, ctx: &JobContext, stage: Stage, log: &mut RunLog) {
        log.skipped.push(stage);
        let mut event = StageEvent::new(ctx.job_id(), stage, StageStatus::Skipped);
        if let Some(artifact) = ctx.checkpoint_artifact(stage) {
            event = event.with_detail(format!("{} already exists", artifact.display()));
        }
        self.events.emit(&event).await;
    }

    /// Create the working directory and drop uncommitted files from a crashed run
    async fn prepare_working_dir(&self, ctx: &JobContext) -> Result<StageOutcome, DomainError> {
        self.fs.create_directory(ctx.working_dir()).await?;
        for path in self.fs.list_files(ctx.working_dir()).await? {
            let stale = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(JobRules::is_partial_file_name);
            if stale {
                info!(path = %path.display(), "Removing uncommitted file from an earlier run");
                self.fs.delete_file(&path).await?;
            }
        }
        Ok(StageOutcome::Produced)
    }

    /// Copy the input into the working directory
    async fn stage_source(&self, ctx: &JobContext) -> Result<StageOutcome, DomainError> {
        if !self.fs.file_exists(ctx.source()).await? {
            return Err(DomainError::Io(format!(
                "Input file not found: {}",
                ctx.source().display()
            )));
        }
        let bytes = self
            .fs
            .copy_file_exclusive(ctx.source(), &ctx.staged_source())
            .await?;
        info!(job_id = %ctx.job_id(), bytes, path = %ctx.staged_source().display(), "Source staged");
        Ok(StageOutcome::Produced)
    }

    /// Mark transcoding complete; only valid once the manifest exists
    async fn write_status_marker(&self, ctx: &JobContext) -> Result<StageOutcome, DomainError> {
        if !self.checkpointer.is_done(&ctx.manifest()).await? {
            return Err(DomainError::Io(format!(
                "Manifest {} missing, refusing to mark transcoding finished",
                ctx.manifest().display()
            )));
        }
        self.fs
            .write_file_exclusive(&ctx.status_marker(), STATUS_FINISHED.as_bytes())
            .await?;
        Ok(StageOutcome::Produced)
    }
}
