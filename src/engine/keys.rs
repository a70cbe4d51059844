//! Key material generation
//!
//! The key and its descriptor are two separate checkpoints. A crash between
//! them is recovered without regenerating the key.

use std::sync::Arc;

use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::engine::{StageCheckpointer, StageOutcome};
use crate::ports::{FsPort, RandomPort};

/// Produces the key file and the key descriptor of a job
pub struct KeyMaterialGenerator {
    fs: Arc<dyn FsPort>,
    random: Arc<dyn RandomPort>,
    checkpointer: Arc<StageCheckpointer>,
    key_uri: String,
}

impl KeyMaterialGenerator {
    pub fn new(
        fs: Arc<dyn FsPort>,
        random: Arc<dyn RandomPort>,
        checkpointer: Arc<StageCheckpointer>,
        key_uri: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            random,
            checkpointer,
            key_uri: key_uri.into(),
        }
    }

    /// Write 16 random bytes to the key file.
    ///
    /// An existing key file is kept as-is without validation.
    pub async fn generate_key(&self, ctx: &JobContext) -> Result<StageOutcome, DomainError> {
        let path = ctx.key_file();
        if self.checkpointer.is_done(&path).await? {
            return Ok(StageOutcome::Skipped);
        }

        let mut bytes = [0u8; KEY_LEN];
        self.random.fill_bytes(&mut bytes)?;
        let key = KeyMaterial::new(bytes);

        self.fs.write_file_exclusive(&path, key.as_bytes()).await?;
        info!(job_id = %ctx.job_id(), path = %path.display(), "Encryption key written");
        Ok(StageOutcome::Produced)
    }

    /// Write the 3-line descriptor pointing the transcoder at the key.
    ///
    /// Requires the key file, since the descriptor embeds its path.
    pub async fn generate_key_descriptor(&self, ctx: &JobContext) -> Result<StageOutcome, DomainError> {
        let path = ctx.key_descriptor();
        if self.checkpointer.is_done(&path).await? {
            return Ok(StageOutcome::Skipped);
        }

        let key_path = ctx.key_file();
        if !self.fs.file_exists(&key_path).await? {
            return Err(DomainError::Io(format!(
                "Key file {} must exist before its descriptor",
                key_path.display()
            )));
        }

        let mut iv = [0u8; IV_LEN];
        self.random.fill_bytes(&mut iv)?;
        let descriptor = KeyDescriptor::new(self.key_uri.as_str(), key_path, &InitVector::new(iv));
        let text = descriptor.render();
        // A line break anywhere in the key path shifts the positional fields.
        KeyDescriptor::parse(&text)?;

        self.fs.write_file_exclusive(&path, text.as_bytes()).await?;
        info!(job_id = %ctx.job_id(), path = %path.display(), "Key descriptor written");
        Ok(StageOutcome::Produced)
    }
}
