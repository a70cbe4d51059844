// Ports - Interface definitions (contracts)

use crate::domain::errors::*;
use crate::domain::model::*;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port for file system operations
///
/// Writes that create job artifacts go through a partial file in the
/// destination directory and are renamed into place, so an artifact path
/// never names a half-written file.
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if a file exists
    async fn file_exists(&self, path: &Path) -> Result<bool, DomainError>;

    /// Check if a directory exists
    async fn directory_exists(&self, path: &Path) -> Result<bool, DomainError>;

    /// Create directory (including parent directories)
    async fn create_directory(&self, path: &Path) -> Result<(), DomainError>;

    /// Copy a file, failing if the destination already exists
    async fn copy_file_exclusive(&self, from: &Path, to: &Path) -> Result<u64, DomainError>;

    /// Copy a file, replacing any existing destination
    async fn copy_file_replace(&self, from: &Path, to: &Path) -> Result<u64, DomainError>;

    /// Write bytes to a new file, failing if it already exists
    async fn write_file_exclusive(&self, path: &Path, contents: &[u8]) -> Result<(), DomainError>;

    /// Regular files directly inside `dir`, sorted by name
    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, DomainError>;

    /// Rename a file within one file system
    async fn rename_file(&self, from: &Path, to: &Path) -> Result<(), DomainError>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<(), DomainError>;

    /// Delete directory recursively
    async fn delete_directory(&self, path: &Path) -> Result<(), DomainError>;
}

/// Port for cryptographic randomness
pub trait RandomPort: Send + Sync {
    /// Fill `dest` with random bytes
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), DomainError>;
}

/// External process invocation
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

/// What a finished process left behind
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Port for running external programs to completion
#[async_trait]
pub trait ProcessPort: Send + Sync {
    /// Run the process and wait for it. Launch failure and timeout are errors;
    /// a non-zero exit is reported through `ProcessOutput`.
    async fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput, DomainError>;
}

/// One file to put in an archive under a flat name
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Archive creation result
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub entries: Vec<String>,
    pub bytes_written: u64,
}

/// Port for archive creation
#[async_trait]
pub trait ArchivePort: Send + Sync {
    /// Create `destination` holding `entries`. On failure `destination` does not exist.
    async fn create_archive(
        &self,
        destination: &Path,
        entries: &[ArchiveEntry],
    ) -> Result<ArchiveReport, DomainError>;
}

/// Port for stage status reporting
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Record a stage event
    async fn emit(&self, event: &StageEvent);
}

/// Port for configuration management
#[async_trait]
pub trait ConfigPort: Send + Sync {
    /// Get configuration value
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Get configuration value with default
    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError>;

    /// Set configuration value
    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Load configuration from file
    async fn load_config(&self, file_path: &Path) -> Result<(), DomainError>;

    /// Validate configuration
    async fn validate_config(&self) -> Result<(), DomainError>;
}
