// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::rules::JobRules;

/// Length of the symmetric key in bytes
pub const KEY_LEN: usize = 16;
/// Length of the initialization vector in bytes
pub const IV_LEN: usize = 16;
/// Key-retrieval identifier written on the first descriptor line
pub const DEFAULT_KEY_URI: &str = "[LINK_TO_ENC_KEY_FILE]";
/// Contents of the status marker
pub const STATUS_FINISHED: &str = "finished";
/// Prefix of in-flight files that have not been committed yet
pub const PARTIAL_PREFIX: &str = ".partial-";

const KEY_FILE_NAME: &str = "enc.key";
const KEY_DESCRIPTOR_NAME: &str = "enc.keyinfo";
const MANIFEST_NAME: &str = "manifest.m3u8";
const STATUS_MARKER_NAME: &str = "status.txt";
const SEGMENT_PATTERN: &str = "%d.ts";

/// Identifier of one packaging job; also keys its working directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Parse a caller-supplied identifier
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        JobRules::validate_job_id(trimmed)?;
        Ok(Self(trimmed.to_string()))
    }

    /// Generate a fresh identifier for a run that does not resume anything
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pipeline states, strictly ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    SourceStaged,
    KeyGenerated,
    DescriptorGenerated,
    Transcoded,
    StatusWritten,
    Packaged,
    Finalized,
    Cleaned,
}

impl Stage {
    /// Every state in execution order
    pub const ALL: [Stage; 9] = [
        Stage::Init,
        Stage::SourceStaged,
        Stage::KeyGenerated,
        Stage::DescriptorGenerated,
        Stage::Transcoded,
        Stage::StatusWritten,
        Stage::Packaged,
        Stage::Finalized,
        Stage::Cleaned,
    ];

    /// Stages whose completion is recorded by an artifact in the working directory
    pub const CHECKPOINTED: [Stage; 6] = [
        Stage::SourceStaged,
        Stage::KeyGenerated,
        Stage::DescriptorGenerated,
        Stage::Transcoded,
        Stage::StatusWritten,
        Stage::Packaged,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::SourceStaged => "source_staged",
            Stage::KeyGenerated => "key_generated",
            Stage::DescriptorGenerated => "descriptor_generated",
            Stage::Transcoded => "transcoded",
            Stage::StatusWritten => "status_written",
            Stage::Packaged => "packaged",
            Stage::Finalized => "finalized",
            Stage::Cleaned => "cleaned",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity and layout of one packaging run
#[derive(Debug, Clone)]
pub struct JobContext {
    source: PathBuf,
    file_name: String,
    extension: Option<String>,
    job_id: JobId,
    working_dir: PathBuf,
}

impl JobContext {
    /// Derive a job context for `source` under `work_root`
    pub fn new(source: impl Into<PathBuf>, job_id: JobId, work_root: &Path) -> Result<Self, DomainError> {
        let source = source.into();
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                DomainError::BadArgs(format!(
                    "Input path has no usable file name: {}",
                    source.display()
                ))
            })?
            .to_string();
        // Descriptor lines embed the working-dir path.
        if file_name.chars().any(char::is_control) {
            return Err(DomainError::BadArgs(format!(
                "Input file name contains control characters: {:?}",
                file_name
            )));
        }
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_string());

        let work_root = std::path::absolute(work_root)
            .map_err(|e| DomainError::io(format!("resolve work root {}", work_root.display()), e))?;
        let working_dir = work_root.join(JobRules::working_dir_name(&job_id, &file_name));

        Ok(Self {
            source,
            file_name,
            extension,
            job_id,
            working_dir,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// File name of the staged raw-input copy
    pub fn staged_source_name(&self) -> String {
        match &self.extension {
            Some(ext) => format!("source.{}", ext),
            None => "source".to_string(),
        }
    }

    pub fn staged_source(&self) -> PathBuf {
        self.working_dir.join(self.staged_source_name())
    }

    pub fn key_file(&self) -> PathBuf {
        self.working_dir.join(KEY_FILE_NAME)
    }

    pub fn key_descriptor(&self) -> PathBuf {
        self.working_dir.join(KEY_DESCRIPTOR_NAME)
    }

    pub fn manifest(&self) -> PathBuf {
        self.working_dir.join(MANIFEST_NAME)
    }

    /// Where the engine writes the playlist before it is committed
    pub fn partial_manifest(&self) -> PathBuf {
        self.working_dir
            .join(format!("{}{}", PARTIAL_PREFIX, MANIFEST_NAME))
    }

    /// Segment name pattern, relative to the working directory.
    ///
    /// The engine expands every `%` in this value, so no part of the
    /// input path may appear in it.
    pub fn segment_pattern(&self) -> &'static str {
        SEGMENT_PATTERN
    }

    pub fn status_marker(&self) -> PathBuf {
        self.working_dir.join(STATUS_MARKER_NAME)
    }

    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.file_name)
    }

    pub fn archive(&self) -> PathBuf {
        self.working_dir.join(self.archive_name())
    }

    /// `<original path>.zip`, next to the input
    pub fn final_output(&self) -> PathBuf {
        let mut path = self.source.as_os_str().to_owned();
        path.push(".zip");
        PathBuf::from(path)
    }

    /// Artifact whose presence marks `stage` as done
    pub fn checkpoint_artifact(&self, stage: Stage) -> Option<PathBuf> {
        match stage {
            Stage::SourceStaged => Some(self.staged_source()),
            Stage::KeyGenerated => Some(self.key_file()),
            Stage::DescriptorGenerated => Some(self.key_descriptor()),
            Stage::Transcoded => Some(self.manifest()),
            Stage::StatusWritten => Some(self.status_marker()),
            Stage::Packaged => Some(self.archive()),
            Stage::Init | Stage::Finalized | Stage::Cleaned => None,
        }
    }
}

/// Raw symmetric key
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    key: [u8; KEY_LEN],
}

impl KeyMaterial {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

// Keep key bytes out of logs.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial").field("len", &KEY_LEN).finish()
    }
}

/// Initialization vector for segment encryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitVector([u8; IV_LEN]);

impl InitVector {
    pub fn new(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    /// Lowercase hex rendering, always 32 characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// The 3-line file telling the engine where the key lives and which IV to use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub key_uri: String,
    pub key_path: PathBuf,
    pub iv_hex: String,
}

impl KeyDescriptor {
    pub fn new(key_uri: impl Into<String>, key_path: impl Into<PathBuf>, iv: &InitVector) -> Self {
        Self {
            key_uri: key_uri.into(),
            key_path: key_path.into(),
            iv_hex: iv.to_hex(),
        }
    }

    /// Render the positional descriptor lines
    pub fn render(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.key_uri,
            self.key_path.display(),
            self.iv_hex
        )
    }

    /// Parse and validate descriptor text
    pub fn parse(content: &str) -> Result<Self, DomainError> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() != 3 {
            return Err(DomainError::BadArgs(format!(
                "Key descriptor must have 3 lines, found {}",
                lines.len()
            )));
        }
        if lines[0].is_empty() || lines[1].is_empty() {
            return Err(DomainError::BadArgs(
                "Key descriptor has an empty field".to_string(),
            ));
        }
        if !JobRules::is_valid_iv_hex(lines[2]) {
            return Err(DomainError::BadArgs(format!(
                "Invalid IV in key descriptor: {}",
                lines[2]
            )));
        }

        Ok(Self {
            key_uri: lines[0].to_string(),
            key_path: PathBuf::from(lines[1]),
            iv_hex: lines[2].to_string(),
        })
    }
}

/// Progress of a stage as reported to the event sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Started,
    Skipped,
    Completed,
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageStatus::Started => "started",
            StageStatus::Skipped => "skipped",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Structured pipeline event
#[derive(Debug, Clone, Serialize)]
pub struct StageEvent {
    pub job_id: JobId,
    pub stage: Stage,
    pub status: StageStatus,
    pub detail: Option<String>,
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

impl StageEvent {
    pub fn new(job_id: &JobId, stage: Stage, status: StageStatus) -> Self {
        Self {
            job_id: job_id.clone(),
            stage,
            status,
            detail: None,
            error: None,
            at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Outcome of a successful packaging run
#[derive(Debug, Clone)]
pub struct PackReport {
    pub job_id: JobId,
    pub final_output: PathBuf,
    pub executed: Vec<Stage>,
    pub skipped: Vec<Stage>,
    pub archive_entries: Vec<String>,
    pub segment_count: usize,
    pub elapsed: Duration,
}

/// Presence of one checkpoint artifact
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointState {
    pub stage: Stage,
    pub artifact: PathBuf,
    pub present: bool,
}

/// Snapshot of a job's working directory
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub job_id: JobId,
    pub working_dir: PathBuf,
    pub working_dir_exists: bool,
    pub final_output: PathBuf,
    pub final_output_exists: bool,
    pub checkpoints: Vec<CheckpointState>,
    /// First stage a run with this job id would execute
    pub resume_from: Stage,
}

impl JobStatus {
    /// True when the job finished and its working area was reclaimed
    pub fn is_complete(&self) -> bool {
        !self.working_dir_exists && self.final_output_exists
    }
}

mod tests;
