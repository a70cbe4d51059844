// Local filesystem adapter - Artifact storage on the host file system

use crate::domain::errors::*;
use crate::domain::model::PARTIAL_PREFIX;
use crate::ports::*;
use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Local filesystem adapter
pub struct LocalFsAdapter;

impl LocalFsAdapter {
    /// Create new local filesystem adapter
    pub fn new() -> Result<Self, DomainError> {
        Ok(Self)
    }

    /// Fill a partial file next to `destination`, sync it, then rename it into place.
    ///
    /// With `replace == false` the rename fails if `destination` exists. The
    /// partial file is removed on every error path.
    fn commit_partial<F>(destination: &Path, replace: bool, fill: F) -> Result<u64, DomainError>
    where
        F: FnOnce(&mut File) -> io::Result<u64>,
    {
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut partial = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(parent)
            .map_err(|e| DomainError::io(format!("create partial file in {}", parent.display()), e))?;

        let written = fill(partial.as_file_mut())
            .map_err(|e| DomainError::io(format!("write {}", destination.display()), e))?;
        partial
            .as_file()
            .sync_all()
            .map_err(|e| DomainError::io(format!("sync {}", destination.display()), e))?;

        let persisted = if replace {
            partial.persist(destination)
        } else {
            partial.persist_noclobber(destination)
        };
        persisted.map_err(|e| DomainError::io(format!("commit {}", destination.display()), e.error))?;

        Ok(written)
    }

    async fn copy_file_internal(from: &Path, to: &Path, replace: bool) -> Result<u64, DomainError> {
        let from = from.to_path_buf();
        let to = to.to_path_buf();
        tokio::task::spawn_blocking(move || {
            Self::commit_partial(&to, replace, |file| {
                let mut source = File::open(&from)?;
                io::copy(&mut source, file)
            })
            .map_err(|e| match e {
                DomainError::Io(msg) => {
                    DomainError::Io(format!("copy {} -> {}: {}", from.display(), to.display(), msg))
                }
                other => other,
            })
        })
        .await
        .map_err(|e| DomainError::Io(format!("copy task failed: {}", e)))?
    }
}

#[async_trait]
impl FsPort for LocalFsAdapter {
    async fn file_exists(&self, path: &Path) -> Result<bool, DomainError> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DomainError::io(format!("stat {}", path.display()), e)),
        }
    }

    async fn directory_exists(&self, path: &Path) -> Result<bool, DomainError> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DomainError::io(format!("stat {}", path.display()), e)),
        }
    }

    async fn create_directory(&self, path: &Path) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| DomainError::io(format!("create directory {}", path.display()), e))
    }

    async fn copy_file_exclusive(&self, from: &Path, to: &Path) -> Result<u64, DomainError> {
        Self::copy_file_internal(from, to, false).await
    }

    async fn copy_file_replace(&self, from: &Path, to: &Path) -> Result<u64, DomainError> {
        Self::copy_file_internal(from, to, true).await
    }

    async fn write_file_exclusive(&self, path: &Path, contents: &[u8]) -> Result<(), DomainError> {
        let path = path.to_path_buf();
        let contents = contents.to_vec();
        tokio::task::spawn_blocking(move || {
            Self::commit_partial(&path, false, |file| {
                io::Write::write_all(file, &contents)?;
                Ok(contents.len() as u64)
            })
        })
        .await
        .map_err(|e| DomainError::Io(format!("write task failed: {}", e)))??;
        Ok(())
    }

    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, DomainError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                DomainError::Io(format!("list {}: {}", dir.display(), e))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    async fn rename_file(&self, from: &Path, to: &Path) -> Result<(), DomainError> {
        tokio::fs::rename(from, to).await.map_err(|e| {
            DomainError::io(format!("rename {} -> {}", from.display(), to.display()), e)
        })
    }

    async fn delete_file(&self, path: &Path) -> Result<(), DomainError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| DomainError::io(format!("delete {}", path.display()), e))
    }

    async fn delete_directory(&self, path: &Path) -> Result<(), DomainError> {
        tokio::fs::remove_dir_all(path)
            .await
            .map_err(|e| DomainError::io(format!("delete directory {}", path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_exclusive_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("status.txt");
        let fs = LocalFsAdapter::new().unwrap();

        fs.write_file_exclusive(&target, b"finished").await.unwrap();
        let err = fs.write_file_exclusive(&target, b"other").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IoError);
        assert_eq!(std::fs::read(&target).unwrap(), b"finished");
    }

    #[tokio::test]
    async fn test_commit_leaves_no_partial_files() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFsAdapter::new().unwrap();
        fs.write_file_exclusive(&dir.path().join("a"), b"1").await.unwrap();
        let _ = fs.write_file_exclusive(&dir.path().join("a"), b"2").await;

        let names: Vec<String> = fs
            .list_files(dir.path())
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_copy_exclusive_and_replace() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFsAdapter::new().unwrap();
        let src = dir.path().join("in.bin");
        let dst = dir.path().join("out.bin");
        std::fs::write(&src, b"payload").unwrap();

        assert_eq!(fs.copy_file_exclusive(&src, &dst).await.unwrap(), 7);
        assert!(fs.copy_file_exclusive(&src, &dst).await.is_err());

        std::fs::write(&src, b"newer").unwrap();
        fs.copy_file_replace(&src, &dst).await.unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"newer");
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFsAdapter::new().unwrap();
        let err = fs
            .copy_file_exclusive(&dir.path().join("missing"), &dir.path().join("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert!(!dir.path().join("x").exists());
    }

    #[tokio::test]
    async fn test_list_files_skips_directories_and_sorts() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFsAdapter::new().unwrap();
        std::fs::write(dir.path().join("b.ts"), b"").unwrap();
        std::fs::write(dir.path().join("a.ts"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.ts"), b"").unwrap();

        let files = fs.list_files(dir.path()).await.unwrap();
        assert_eq!(files, vec![dir.path().join("a.ts"), dir.path().join("b.ts")]);
    }

    #[tokio::test]
    async fn test_exists_probes() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFsAdapter::new().unwrap();
        assert!(fs.directory_exists(dir.path()).await.unwrap());
        assert!(!fs.file_exists(dir.path()).await.unwrap());
        assert!(!fs.file_exists(&dir.path().join("nope")).await.unwrap());
    }
}
