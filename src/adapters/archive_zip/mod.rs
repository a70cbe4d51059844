// Zip archive adapter - Job bundle creation using the zip crate

use crate::domain::errors::*;
use crate::domain::model::PARTIAL_PREFIX;
use crate::ports::*;
use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Highest deflate level
pub const MAX_COMPRESSION_LEVEL: i64 = 9;

/// Zip archive adapter
pub struct ZipArchiveAdapter {
    compression_level: i64,
}

impl ZipArchiveAdapter {
    /// Create new zip adapter using maximum compression
    pub fn new() -> Result<Self, DomainError> {
        Ok(Self {
            compression_level: MAX_COMPRESSION_LEVEL,
        })
    }

    fn archive_error(action: &str, path: &Path, err: impl std::fmt::Display) -> DomainError {
        DomainError::Archive(format!("{} {}: {}", action, path.display(), err))
    }

    /// Write the archive to a partial file and rename it into place
    fn write_archive(
        destination: &Path,
        entries: &[ArchiveEntry],
        level: i64,
    ) -> Result<ArchiveReport, DomainError> {
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let partial = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(parent)
            .map_err(|e| Self::archive_error("create partial archive in", parent, e))?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(level))
            .unix_permissions(0o644);

        let mut zip = ZipWriter::new(partial);
        let mut names = Vec::with_capacity(entries.len());
        for entry in entries {
            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| Self::archive_error("start entry for", &entry.path, e))?;
            let mut source = File::open(&entry.path)
                .map_err(|e| Self::archive_error("open", &entry.path, e))?;
            io::copy(&mut source, &mut zip)
                .map_err(|e| Self::archive_error("compress", &entry.path, e))?;
            names.push(entry.name.clone());
            debug!(entry = %entry.name, "Added archive entry");
        }

        let partial = zip
            .finish()
            .map_err(|e| Self::archive_error("finalize", destination, e))?;
        partial
            .as_file()
            .sync_all()
            .map_err(|e| Self::archive_error("sync", destination, e))?;
        let bytes_written = partial
            .as_file()
            .metadata()
            .map_err(|e| Self::archive_error("stat", destination, e))?
            .len();
        partial
            .persist_noclobber(destination)
            .map_err(|e| Self::archive_error("commit", destination, e.error))?;

        Ok(ArchiveReport {
            entries: names,
            bytes_written,
        })
    }
}

#[async_trait]
impl ArchivePort for ZipArchiveAdapter {
    async fn create_archive(
        &self,
        destination: &Path,
        entries: &[ArchiveEntry],
    ) -> Result<ArchiveReport, DomainError> {
        let destination: PathBuf = destination.to_path_buf();
        let entries = entries.to_vec();
        let level = self.compression_level;
        tokio::task::spawn_blocking(move || Self::write_archive(&destination, &entries, level))
            .await
            .map_err(|e| DomainError::Archive(format!("archive task failed: {}", e)))?
    }
}
