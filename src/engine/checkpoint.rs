//! Artifact-existence gate shared by every stage

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{JobContext, Stage};
use crate::ports::FsPort;

/// Reports whether a stage's artifact has already been produced.
///
/// This is a plain existence probe. It is sound only because every artifact
/// is committed by an exclusive rename, so a path never names a partial file.
pub struct StageCheckpointer {
    fs: Arc<dyn FsPort>,
}

impl StageCheckpointer {
    pub fn new(fs: Arc<dyn FsPort>) -> Self {
        Self { fs }
    }

    /// True when `artifact` exists
    pub async fn is_done(&self, artifact: &Path) -> Result<bool, DomainError> {
        let done = self.fs.file_exists(artifact).await?;
        if done {
            debug!(path = %artifact.display(), "Checkpoint present");
        }
        Ok(done)
    }

    /// True when the artifact recording `stage` exists; stages without an
    /// artifact are never considered done
    pub async fn is_stage_done(&self, ctx: &JobContext, stage: Stage) -> Result<bool, DomainError> {
        match ctx.checkpoint_artifact(stage) {
            Some(artifact) => self.is_done(&artifact).await,
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalFsAdapter;
    use crate::domain::model::JobId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_probe_follows_artifact_presence() {
        let root = TempDir::new().unwrap();
        let ctx = JobContext::new("/videos/clip.mp4", JobId::generate(), root.path()).unwrap();
        std::fs::create_dir_all(ctx.working_dir()).unwrap();
        let checkpointer = StageCheckpointer::new(Arc::new(LocalFsAdapter::new().unwrap()));

        assert!(!checkpointer.is_stage_done(&ctx, Stage::KeyGenerated).await.unwrap());
        std::fs::write(ctx.key_file(), [0u8; 16]).unwrap();
        assert!(checkpointer.is_stage_done(&ctx, Stage::KeyGenerated).await.unwrap());
        assert!(checkpointer.is_done(&ctx.key_file()).await.unwrap());
    }

    #[tokio::test]
    async fn test_stages_without_artifact_are_never_done() {
        let root = TempDir::new().unwrap();
        let ctx = JobContext::new("/videos/clip.mp4", JobId::generate(), root.path()).unwrap();
        let checkpointer = StageCheckpointer::new(Arc::new(LocalFsAdapter::new().unwrap()));
        assert!(!checkpointer.is_stage_done(&ctx, Stage::Finalized).await.unwrap());
        assert!(!checkpointer.is_stage_done(&ctx, Stage::Cleaned).await.unwrap());
    }
}
