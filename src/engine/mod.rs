//! Packaging stage components
//!
//! Each component produces one kind of job artifact and consults the
//! [`checkpoint::StageCheckpointer`] first, so calling it again after the
//! artifact exists is a no-op.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

pub mod checkpoint;
pub mod finalizer;
pub mod keys;
pub mod packager;
pub mod transcode;

pub use checkpoint::StageCheckpointer;
pub use finalizer::Finalizer;
pub use keys::KeyMaterialGenerator;
pub use packager::ArchivePackager;
pub use transcode::TranscodeInvoker;

/// Default HLS segment length in seconds
pub const DEFAULT_SEGMENT_DURATION: u32 = 9;

/// Settings shared by the stage components
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSettings {
    /// Transcoder executable
    pub ffmpeg_path: PathBuf,
    /// Directory holding per-job working directories
    pub work_root: PathBuf,
    /// HLS segment length in seconds
    pub segment_duration: u32,
    /// First line of the key descriptor
    pub key_uri: String,
    /// Upper bound on one transcoder run
    pub timeout: Option<Duration>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            work_root: crate::utils::path::PathUtils::default_work_root(),
            segment_duration: DEFAULT_SEGMENT_DURATION,
            key_uri: crate::domain::model::DEFAULT_KEY_URI.to_string(),
            timeout: None,
        }
    }
}

/// Whether a stage did work or found its artifact already present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Produced,
    Skipped,
}
