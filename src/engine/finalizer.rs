//! Publishing the archive and reclaiming the working area

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::JobContext;
use crate::ports::FsPort;

/// Hands the archive off next to the source and removes the job directory
pub struct Finalizer {
    fs: Arc<dyn FsPort>,
}

impl Finalizer {
    pub fn new(fs: Arc<dyn FsPort>) -> Self {
        Self { fs }
    }

    /// Copy the archive to `<source>.zip`, replacing an older one
    pub async fn publish(&self, ctx: &JobContext) -> Result<PathBuf, DomainError> {
        let destination = ctx.final_output();
        let bytes = self.fs.copy_file_replace(&ctx.archive(), &destination).await?;
        info!(job_id = %ctx.job_id(), path = %destination.display(), bytes, "Final archive published");
        Ok(destination)
    }

    /// Recursively remove the working directory
    pub async fn clean(&self, ctx: &JobContext) -> Result<(), DomainError> {
        self.fs.delete_directory(ctx.working_dir()).await?;
        info!(job_id = %ctx.job_id(), path = %ctx.working_dir().display(), "Working directory removed");
        Ok(())
    }
}
