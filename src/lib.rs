//! hlspack library
//!
//! Turns one media file into an AES-128 encrypted HLS package and bundles the
//! package into a zip archive placed next to the input. Every stage leaves an
//! artifact in a per-job working directory, so an interrupted job resumes
//! where it stopped when run again with the same job id.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{AppContainer, DefaultAppContainer, PackageInteractor};
pub use domain::errors::{DomainError, ErrorKind};
pub use domain::model::{JobContext, JobId, JobStatus, PackReport, Stage, StageEvent, StageStatus};
pub use engine::PipelineSettings;
pub use error::{PackError, PackResult};
