//! Archive packaging of a job's artifacts

use std::sync::Arc;

use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::JobContext;
use crate::domain::rules::JobRules;
use crate::engine::{StageCheckpointer, StageOutcome};
use crate::ports::{ArchiveEntry, ArchivePort, FsPort};
use crate::utils::Utils;

/// Bundles the working directory into one archive
pub struct ArchivePackager {
    fs: Arc<dyn FsPort>,
    archive: Arc<dyn ArchivePort>,
    checkpointer: Arc<StageCheckpointer>,
}

impl ArchivePackager {
    pub fn new(
        fs: Arc<dyn FsPort>,
        archive: Arc<dyn ArchivePort>,
        checkpointer: Arc<StageCheckpointer>,
    ) -> Self {
        Self {
            fs,
            archive,
            checkpointer,
        }
    }

    /// Every file in the working directory except the staged input, under its base name
    pub async fn collect_entries(&self, ctx: &JobContext) -> Result<Vec<ArchiveEntry>, DomainError> {
        let staged = ctx.staged_source_name();
        let mut entries = Vec::new();
        for path in self.fs.list_files(ctx.working_dir()).await? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return Err(DomainError::Archive(format!(
                    "Artifact name is not valid UTF-8: {}",
                    path.display()
                )));
            };
            if name == staged || JobRules::is_partial_file_name(name) {
                continue;
            }
            entries.push(ArchiveEntry {
                name: name.to_string(),
                path: path.clone(),
            });
        }
        Ok(entries)
    }

    /// Create the job archive once the status marker exists.
    ///
    /// Returns the archived entry names; empty when the archive already existed.
    pub async fn package(&self, ctx: &JobContext) -> Result<(StageOutcome, Vec<String>), DomainError> {
        let destination = ctx.archive();
        if self.checkpointer.is_done(&destination).await? {
            return Ok((StageOutcome::Skipped, Vec::new()));
        }

        if !self.checkpointer.is_done(&ctx.status_marker()).await? {
            return Err(DomainError::Archive(format!(
                "Status marker {} missing, transcoding is not complete",
                ctx.status_marker().display()
            )));
        }

        let entries = self.collect_entries(ctx).await?;
        let report = self.archive.create_archive(&destination, &entries).await?;
        info!(
            job_id = %ctx.job_id(),
            entries = report.entries.len(),
            size = %Utils::format_file_size(report.bytes_written),
            path = %destination.display(),
            "Archive created"
        );
        Ok((StageOutcome::Produced, report.entries))
    }
}
